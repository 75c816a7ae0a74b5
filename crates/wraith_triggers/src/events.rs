//! Trap events

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wraith_core::ActorId;

/// Type of trap event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapEventType {
    /// First occupant entered the zone
    Enter,
    /// Last occupant left the zone
    Exit,
    /// An appear request was issued for a member
    AppearRequested,
    /// A disappear request was issued for a member
    DisappearRequested,
    /// Every member was idle and the containers were switched off
    Deactivated,
}

/// A trap event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrapEvent {
    /// Type of event
    pub event_type: TrapEventType,
    /// Occupant that caused an enter/exit, if known
    pub entity: Option<u64>,
    /// Member the request was issued for
    pub actor: Option<ActorId>,
    /// Time since the trap was created
    pub at: Duration,
}

impl TrapEvent {
    fn new(event_type: TrapEventType, at: Duration) -> Self {
        Self {
            event_type,
            entity: None,
            actor: None,
            at,
        }
    }

    /// Create an enter event
    pub fn enter(entity: Option<u64>, at: Duration) -> Self {
        Self {
            entity,
            ..Self::new(TrapEventType::Enter, at)
        }
    }

    /// Create an exit event
    pub fn exit(entity: Option<u64>, at: Duration) -> Self {
        Self {
            entity,
            ..Self::new(TrapEventType::Exit, at)
        }
    }

    pub fn appear_requested(actor: ActorId, at: Duration) -> Self {
        Self {
            actor: Some(actor),
            ..Self::new(TrapEventType::AppearRequested, at)
        }
    }

    pub fn disappear_requested(actor: ActorId, at: Duration) -> Self {
        Self {
            actor: Some(actor),
            ..Self::new(TrapEventType::DisappearRequested, at)
        }
    }

    pub fn deactivated(at: Duration) -> Self {
        Self::new(TrapEventType::Deactivated, at)
    }

    /// Check if this is an enter event
    pub fn is_enter(&self) -> bool {
        self.event_type == TrapEventType::Enter
    }

    /// Check if this is an exit event
    pub fn is_exit(&self) -> bool {
        self.event_type == TrapEventType::Exit
    }
}
