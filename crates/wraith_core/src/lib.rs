//! # wraith_core - Actor Lifecycle Primitives
//!
//! Shared building blocks for the transient actor lifecycle crates:
//! - **Identity**: [`ActorId`] and [`TemplateId`]
//! - **Poses**: position + rotation handed to factories and fade requests
//! - **Busy leases**: scoped reference counts that mark an actor as mid-transition
//! - **Cancellation scopes**: "current in-flight sequence" slots with supersession
//! - **Cooperative waits**: delays and frame steps that race a cancellation token
//!
//! Every sequence in the workspace is a tokio task that suspends only through
//! the helpers in [`tick`]. Locks are never held across an `.await`.

pub mod error;
pub mod id;
pub mod lease;
pub mod pose;
pub mod scope;
pub mod tick;

pub use error::*;
pub use id::*;
pub use lease::*;
pub use pose::*;
pub use scope::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{LifecycleError, Result};
    pub use crate::id::{ActorId, TemplateId};
    pub use crate::lease::{BusyGuard, BusyLease};
    pub use crate::pose::Pose;
    pub use crate::scope::{CancellationSlot, ScopeTicket};
    pub use crate::tick::{delay, next_frame, wait_until, FrameClock};
    pub use tokio_util::sync::CancellationToken;
}
