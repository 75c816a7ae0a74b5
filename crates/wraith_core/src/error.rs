//! Error types shared by the lifecycle crates

use crate::id::ActorId;
use thiserror::Error;

/// Failures a lifecycle sequence can run into.
///
/// None of these are surfaced to the driver that issued a request: spawn and
/// fade operations log them and degrade to "no visible effect". They exist so
/// sequence bodies can use `?` and be caught in one place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// No actor template is configured on the coordinator
    #[error("No actor template configured")]
    MissingTemplate,

    /// Spatial lookup found nothing to spawn against
    #[error("No valid spawn location near an object with role '{role}'")]
    NoSpawnLocation { role: String },

    /// The underlying actor was destroyed outside of this subsystem
    #[error("Actor {0} no longer exists")]
    ActorGone(ActorId),

    /// The sequence's cancellation scope was cancelled
    #[error("Sequence cancelled")]
    Cancelled,

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LifecycleError {
    /// Whether this is the expected cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the target actor vanished underneath the sequence
    pub fn is_actor_gone(&self) -> bool {
        matches!(self, Self::ActorGone(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LifecycleError>;
