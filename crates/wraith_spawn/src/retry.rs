//! Load pose resolution

use wraith_core::Pose;

/// Candidate poses for the next "load" of an actor, in priority order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryPoints {
    /// Override set by level scripting (checkpoints, narrative zones)
    pub retry: Option<Pose>,
    /// Level-authored start pose
    pub start: Option<Pose>,
    /// Last saved player-adjacent pose
    pub last_player: Option<Pose>,
}

impl RetryPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, pose: Pose) -> Self {
        self.start = Some(pose);
        self
    }

    /// Pose the next load would use, without consuming anything
    pub fn resolve(&self) -> Option<Pose> {
        self.retry.or(self.start).or(self.last_player)
    }

    /// Pose for a load; the retry override is used up
    pub fn take_for_load(&mut self) -> Option<Pose> {
        self.retry.take().or(self.start).or(self.last_player)
    }
}
