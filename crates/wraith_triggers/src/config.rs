//! Trap configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wraith_core::tick::secs;
use wraith_core::{LifecycleError, Result};

/// Timing of a proximity trap, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapConfig {
    /// Presence required before the batch appears
    pub countdown: f32,
    /// Delay between leaving the zone and the batch disappearing
    pub exit_delay: f32,
    /// Polling interval while waiting for members to go idle
    pub frame_interval: f32,
    /// Tag an entity needs to count as an occupant (empty accepts anything)
    pub occupant_tag: String,
    /// Entities carrying any of these tags never count as occupants
    pub ignored_tags: Vec<String>,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            countdown: 10.0,
            exit_delay: 3.0,
            frame_interval: 1.0 / 60.0,
            occupant_tag: "player".to_string(),
            ignored_tags: Vec::new(),
        }
    }
}

impl TrapConfig {
    pub fn with_countdown(mut self, seconds: f32) -> Self {
        self.countdown = seconds;
        self
    }

    pub fn with_exit_delay(mut self, seconds: f32) -> Self {
        self.exit_delay = seconds;
        self
    }

    /// Never count entities tagged `tag`
    pub fn ignoring(mut self, tag: impl Into<String>) -> Self {
        self.ignored_tags.push(tag.into());
        self
    }

    pub fn countdown_duration(&self) -> Duration {
        secs(self.countdown)
    }

    pub fn exit_delay_duration(&self) -> Duration {
        secs(self.exit_delay)
    }

    pub fn frame_duration(&self) -> Duration {
        secs(self.frame_interval)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("countdown", self.countdown), ("exit_delay", self.exit_delay)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LifecycleError::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.frame_interval.is_finite() || self.frame_interval <= 0.0 {
            return Err(LifecycleError::InvalidConfig(format!(
                "frame_interval must be positive, got {}",
                self.frame_interval
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(TrapConfig::default().validate().is_ok());
        assert!(TrapConfig::default().with_countdown(-1.0).validate().is_err());

        let mut config = TrapConfig::default();
        config.frame_interval = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = TrapConfig::default().with_countdown(2.5).with_exit_delay(0.5);
        assert_eq!(config.countdown_duration(), Duration::from_millis(2500));
        assert_eq!(config.exit_delay_duration(), Duration::from_millis(500));
    }
}
