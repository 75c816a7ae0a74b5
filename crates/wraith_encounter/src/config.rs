//! Encounter configuration

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wraith_core::tick::secs;
use wraith_core::{LifecycleError, Result};

/// Timing and placement of encounter sessions
///
/// Times are in seconds. Both windows are drawn uniformly from `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Shortest wait before a spawn
    pub min_spawn_time: f32,
    /// Longest wait before a spawn
    pub max_spawn_time: f32,
    /// Shortest chase
    pub min_chase_time: f32,
    /// Longest chase
    pub max_chase_time: f32,
    /// Role the actor hunts (looked up through the spatial lookup)
    pub target_role: String,
    /// Point the target search starts from
    pub search_origin: Vec3,
    /// Offset from the target at which the actor is spawned
    pub spawn_offset: Vec3,
    /// RNG seed; entropy when unset
    pub seed: Option<u64>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            min_spawn_time: 20.0,
            max_spawn_time: 45.0,
            min_chase_time: 8.0,
            max_chase_time: 15.0,
            target_role: "player".to_string(),
            search_origin: Vec3::ZERO,
            spawn_offset: Vec3::new(0.0, 0.0, -8.0),
            seed: None,
        }
    }
}

impl EncounterConfig {
    pub fn with_spawn_window(mut self, min: f32, max: f32) -> Self {
        self.min_spawn_time = min;
        self.max_spawn_time = max;
        self
    }

    pub fn with_chase_window(mut self, min: f32, max: f32) -> Self {
        self.min_chase_time = min;
        self.max_chase_time = max;
        self
    }

    pub fn with_target_role(mut self, role: impl Into<String>) -> Self {
        self.target_role = role.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw the wait before the next spawn
    pub fn draw_spawn_wait<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        secs(draw(rng, self.min_spawn_time, self.max_spawn_time))
    }

    /// Draw the length of the next chase
    pub fn draw_chase_time<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        secs(draw(rng, self.min_chase_time, self.max_chase_time))
    }

    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("spawn", self.min_spawn_time, self.max_spawn_time),
            ("chase", self.min_chase_time, self.max_chase_time),
        ];
        for (name, min, max) in windows {
            if !min.is_finite() || !max.is_finite() || min < 0.0 {
                return Err(LifecycleError::InvalidConfig(format!(
                    "{} window must be non-negative, got [{}, {}]",
                    name, min, max
                )));
            }
            if min > max {
                return Err(LifecycleError::InvalidConfig(format!(
                    "{} window is inverted: min {} > max {}",
                    name, min, max
                )));
            }
        }
        if self.target_role.is_empty() {
            return Err(LifecycleError::InvalidConfig(
                "target_role must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Uniform draw from `[min, max]`; a degenerate or non-finite range yields `min`
fn draw<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if !min.is_finite() || !max.is_finite() || min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_draws_stay_in_window() {
        let config = EncounterConfig::default().with_spawn_window(3.0, 6.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let wait = config.draw_spawn_wait(&mut rng);
            assert!(wait >= Duration::from_secs(3) && wait <= Duration::from_secs(6));
        }
    }

    #[test]
    fn test_degenerate_window_is_exact() {
        let config = EncounterConfig::default().with_spawn_window(5.0, 5.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(config.draw_spawn_wait(&mut rng), Duration::from_secs(5));
    }

    #[test]
    fn test_non_finite_window_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let open = EncounterConfig::default().with_spawn_window(2.0, f32::INFINITY);
        assert_eq!(open.draw_spawn_wait(&mut rng), Duration::from_secs(2));

        let broken = EncounterConfig::default().with_chase_window(f32::NAN, 4.0);
        assert_eq!(broken.draw_chase_time(&mut rng), Duration::ZERO);
        assert!(open.validate().is_err());
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(EncounterConfig::default().validate().is_ok());
        assert!(EncounterConfig::default()
            .with_chase_window(4.0, 2.0)
            .validate()
            .is_err());
        assert!(EncounterConfig::default()
            .with_spawn_window(-1.0, 2.0)
            .validate()
            .is_err());
        assert!(EncounterConfig::default()
            .with_target_role("")
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EncounterConfig =
            serde_json::from_str(r#"{ "min_spawn_time": 1.0, "seed": 42 }"#).unwrap();
        assert_eq!(config.min_spawn_time, 1.0);
        assert_eq!(config.max_spawn_time, 45.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.target_role, "player");
    }
}
