//! Wraith Encounter - Encounter Scheduling
//!
//! [`EncounterScheduler`] decides *when* a [`SpawnCoordinator`] should produce
//! a new actor and drives it through one encounter session:
//!
//! ```text
//! Idle -> WaitingForWindow -> Spawning -> Chasing -> Retreating -> Idle
//! ```
//!
//! The loop runs as one tokio task per `start_loop` and is tied to a
//! [`ModeSignal`] subscription: leaving active play hides the current actor
//! immediately and ends the loop.
//!
//! [`SpawnCoordinator`]: wraith_spawn::SpawnCoordinator
//! [`ModeSignal`]: wraith_gamestate::ModeSignal

pub mod config;
pub mod lookup;
pub mod scheduler;
pub mod session;

pub mod prelude {
    pub use crate::config::EncounterConfig;
    pub use crate::lookup::{SpatialLookup, StaticLookup};
    pub use crate::scheduler::EncounterScheduler;
    pub use crate::session::{EncounterState, SessionLog, SessionTransition};
}

pub use prelude::*;
