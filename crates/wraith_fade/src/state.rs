//! Fade state and configuration

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wraith_core::tick::secs;
use wraith_core::{LifecycleError, Result};

/// Visual lifecycle state of one actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FadeState {
    /// Fully transparent and structurally disabled
    Hidden,
    /// Fading towards full opacity
    FadingIn,
    /// Fully opaque
    Visible,
    /// Fading towards hidden
    FadingOut,
    /// Holding (or moving towards) a non-terminal opacity/tint
    PartiallyFaded,
}

impl Default for FadeState {
    fn default() -> Self {
        Self::Hidden
    }
}

impl FadeState {
    /// Whether a sequence is moving the actor between terminal states
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::FadingIn | Self::FadingOut)
    }
}

/// Timing and appearance settings for one controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Appear duration in seconds
    pub fade_in: f32,
    /// Disappear duration in seconds
    pub fade_out: f32,
    /// Interpolation step in seconds
    pub frame_interval: f32,
    /// Return to the position recorded at construction after disappearing
    pub reset_position_on_hide: bool,
    /// Tint applied when the actor appears
    pub visible_tint: Vec3,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_in: 1.0,
            fade_out: 1.0,
            frame_interval: 1.0 / 60.0,
            reset_position_on_hide: false,
            visible_tint: Vec3::ONE,
        }
    }
}

impl FadeConfig {
    /// Set both fade durations
    pub fn with_durations(mut self, fade_in: f32, fade_out: f32) -> Self {
        self.fade_in = fade_in;
        self.fade_out = fade_out;
        self
    }

    /// Set the interpolation step
    pub fn with_frame_interval(mut self, frame_interval: f32) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Return to the initial position after every disappearance
    pub fn with_position_reset(mut self) -> Self {
        self.reset_position_on_hide = true;
        self
    }

    pub fn fade_in_duration(&self) -> Duration {
        secs(self.fade_in)
    }

    pub fn fade_out_duration(&self) -> Duration {
        secs(self.fade_out)
    }

    pub fn frame_duration(&self) -> Duration {
        secs(self.frame_interval)
    }

    /// Reject negative durations and a non-positive frame step
    pub fn validate(&self) -> Result<()> {
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;
        if !non_negative(self.fade_in) || !non_negative(self.fade_out) {
            return Err(LifecycleError::InvalidConfig(format!(
                "fade durations must be non-negative (fade_in={}, fade_out={})",
                self.fade_in, self.fade_out
            )));
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
