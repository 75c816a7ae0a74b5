//! Wraith Triggers - Proximity Traps
//!
//! A [`ProximityTrapActivator`] owns a batch of actors and reacts to a trigger
//! zone. Sustained presence in the zone makes the batch appear; leaving it
//! makes the batch disappear and, once every member has finished fading,
//! deactivates their containers.
//!
//! # Features
//!
//! - Countdown on enter, cancelled by leaving early
//! - Per-member "wait until idle" before each appear request
//! - Delayed, batched disappearance that re-entry cancels
//! - Occupant tracking with tag filtering
//! - Queued trap events
//!
//! # Example
//!
//! ```ignore
//! use wraith_triggers::prelude::*;
//!
//! let trap = ProximityTrapActivator::new(TrapConfig::default(), members)
//!     .with_filter(TrapFilter::new().with_tag("player"));
//!
//! trap.process_overlap(player_entity, true, &player_tags);
//! ```

pub mod activator;
pub mod config;
pub mod events;
pub mod filter;
pub mod member;

pub mod prelude {
    pub use crate::activator::{ProximityTrapActivator, TrapPhase};
    pub use crate::config::TrapConfig;
    pub use crate::events::{TrapEvent, TrapEventType};
    pub use crate::filter::TrapFilter;
    pub use crate::member::{ContainerSwitch, MemoryContainer, TrapMember};
}

pub use prelude::*;
