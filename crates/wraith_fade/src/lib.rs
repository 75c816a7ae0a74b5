//! Wraith Fade - Actor Appear/Disappear Sequences
//!
//! Each actor gets one [`ActorFadeController`]. It is the only thing in the
//! workspace that writes to an actor's [`VisualSurface`]; drivers request
//! transitions and watch [`ActorFadeController::is_busy`].
//!
//! # Features
//!
//! - Appear: snap to transparent + enabled, reposition, fade 0 -> 1
//! - Disappear: fade to 0, disable, optionally return to the initial position
//! - Immediate disappear that overrides any running sequence
//! - Partial fades to an arbitrary opacity/tint for damaged or alerted looks
//! - Supersession: a new request cancels the previous one before touching anything
//! - Busy leases released on every exit path
//!
//! # Example
//!
//! ```ignore
//! use wraith_fade::prelude::*;
//!
//! let surface = Arc::new(MemorySurface::new(actor));
//! let fade = ActorFadeController::new(actor, surface, FadeConfig::default());
//!
//! fade.request_appear(Vec3::new(4.0, 0.0, 2.0));
//! // ... later
//! if !fade.is_busy() {
//!     fade.request_disappear(false).wait().await;
//! }
//! ```

pub mod controller;
pub mod state;
pub mod surface;

pub mod prelude {
    pub use crate::controller::{ActionSequence, ActorFadeController, FadeOutcome, FadeTask};
    pub use crate::state::{FadeConfig, FadeState};
    pub use crate::surface::{MemorySurface, SurfaceSnapshot, VisualSurface};
}

pub use prelude::*;
