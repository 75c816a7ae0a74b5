//! Wraith Spawn - Actor Spawning
//!
//! A [`SpawnCoordinator`] owns a single actor slot. Spawning always destroys
//! the previous occupant first, so at most one instance is alive per
//! coordinator. It also resolves the effective pursuit flag from the
//! Story/Random mode and the AI toggle, runs the automatic despawn timer in
//! Random mode, and resolves where the actor should load on a retry.
//!
//! The host supplies an [`ActorFactory`]; [`MemoryFactory`] is an in-memory
//! implementation for headless runs and tests.

pub mod coordinator;
pub mod factory;
pub mod retry;

pub mod prelude {
    pub use crate::coordinator::{ActorInstance, SpawnConfig, SpawnContext, SpawnCoordinator, SpawnMode};
    pub use crate::factory::{ActorFactory, MemoryFactory, MemoryPursuit, PursuitDriver, SpawnedActor};
    pub use crate::retry::RetryPoints;
}

pub use prelude::*;
