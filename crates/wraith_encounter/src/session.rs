//! Encounter session state

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Phase of the current encounter session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncounterState {
    /// No loop running, or between sessions
    #[default]
    Idle,
    /// Waiting out the randomised spawn window
    WaitingForWindow,
    /// Locating a target and spawning the actor
    Spawning,
    /// The actor is visible and pursuing
    Chasing,
    /// The actor is fading out
    Retreating,
}

/// One recorded state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTransition {
    pub from: EncounterState,
    pub to: EncounterState,
    /// Time since the log was created
    pub at: Duration,
}

/// Current encounter state with its transition history
#[derive(Debug)]
pub struct SessionLog {
    state: EncounterState,
    origin: Instant,
    transitions: Vec<SessionTransition>,
}

impl SessionLog {
    /// Start an empty log in `Idle`, measuring time from now
    pub fn new() -> Self {
        Self {
            state: EncounterState::Idle,
            origin: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn transitions(&self) -> &[SessionTransition] {
        &self.transitions
    }

    /// Move to `to`, recording the change; returns false if already there
    pub fn enter(&mut self, to: EncounterState) -> bool {
        if self.state == to {
            return false;
        }
        let transition = SessionTransition {
            from: self.state,
            to,
            at: self.origin.elapsed(),
        };
        log::debug!(
            "Encounter {:?} -> {:?} at {:.3}s",
            transition.from,
            transition.to,
            transition.at.as_secs_f32()
        );
        self.transitions.push(transition);
        self.state = to;
        true
    }

    /// Number of times `state` was entered
    pub fn entries(&self, state: EncounterState) -> usize {
        self.transitions.iter().filter(|t| t.to == state).count()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_records_transitions_with_time() {
        let mut log = SessionLog::new();
        assert_eq!(log.state(), EncounterState::Idle);

        assert!(log.enter(EncounterState::WaitingForWindow));
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(log.enter(EncounterState::Spawning));
        assert!(!log.enter(EncounterState::Spawning));

        let transitions = log.transitions();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].from, EncounterState::Idle);
        assert_eq!(transitions[1].at, Duration::from_secs(3));
        assert_eq!(log.entries(EncounterState::Spawning), 1);
    }
}
