//! Runtime Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variable: `WRAITH_CONFIG=/path/to/wraith.toml`
//! 2. Config file in the working directory: `wraith.toml`
//! 3. Built-in defaults
//!
//! `WRAITH_SEED` and `WRAITH_DURATION` override the encounter seed and the
//! simulated duration after the file is loaded.
//!
//! # Example Config File
//!
//! ```toml
//! [spawn]
//! template = "wraith"
//! mode = "random"
//!
//! [spawn.fade]
//! fade_in = 1.5
//! fade_out = 2.0
//!
//! [encounter]
//! min_spawn_time = 5.0
//! max_spawn_time = 12.0
//! target_role = "player"
//!
//! [trap]
//! countdown = 4.0
//! exit_delay = 2.0
//!
//! [simulation]
//! duration = 90.0
//! timeline = [{ at = 30.0, mode = "paused" }, { at = 40.0, mode = "playing" }]
//! trap_visits = [{ enter = 10.0, exit = 25.0 }]
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wraith_core::LifecycleError;
use wraith_encounter::EncounterConfig;
use wraith_gamestate::GameMode;
use wraith_spawn::SpawnConfig;
use wraith_triggers::TrapConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "WRAITH_CONFIG";
/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "wraith.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] LifecycleError),
}

/// A scheduled mode change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeCue {
    /// Seconds since the start of the run
    pub at: f32,
    pub mode: GameMode,
}

/// One stay of the player inside the trap zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapVisit {
    pub enter: f32,
    pub exit: f32,
}

/// Headless run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds to run for
    pub duration: f32,
    /// Skip idle time instead of waiting in real time
    pub fast_forward: bool,
    /// Mode at the start of the run
    pub initial_mode: GameMode,
    /// Mode changes during the run
    pub timeline: Vec<ModeCue>,
    /// Where the player stands (the encounter target)
    pub player_position: Vec3,
    /// Number of actors the trap manages
    pub trap_members: usize,
    /// Where the trap actors appear
    pub trap_position: Vec3,
    /// Player visits to the trap zone
    pub trap_visits: Vec<TrapVisit>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: 120.0,
            fast_forward: true,
            initial_mode: GameMode::Playing,
            timeline: Vec::new(),
            player_position: Vec3::ZERO,
            trap_members: 3,
            trap_position: Vec3::new(0.0, 0.0, 20.0),
            trap_visits: Vec::new(),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WraithConfig {
    pub spawn: SpawnConfig,
    pub encounter: EncounterConfig,
    pub trap: TrapConfig,
    pub simulation: SimulationConfig,
    /// File the config was loaded from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for WraithConfig {
    fn default() -> Self {
        Self {
            spawn: SpawnConfig::default().with_template("wraith"),
            encounter: EncounterConfig::default(),
            trap: TrapConfig::default(),
            simulation: SimulationConfig::default(),
            config_path: None,
        }
    }
}

impl WraithConfig {
    /// Load configuration from all sources
    ///
    /// A file that fails to load or validate is logged and skipped.
    pub fn load() -> Self {
        let mut config = Self::default();

        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                candidates.push(PathBuf::from(path));
            }
        }
        candidates.push(PathBuf::from(DEFAULT_CONFIG_FILE));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(loaded) => {
                    config = loaded;
                    log::info!("Loaded config from {}", path.display());
                    break;
                }
                Err(err) => log::warn!("Ignoring {}: {}", path.display(), err),
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        if let Err(err) = config.validate() {
            log::error!("Environment overrides rejected ({}), using file values", err);
            let path = config.config_path.clone();
            config = path
                .and_then(|path| Self::load_from_file(&path).ok())
                .unwrap_or_default();
        }
        config
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WRAITH_SEED` / `WRAITH_DURATION` from `var`
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = var("WRAITH_SEED") {
            match seed.trim().parse() {
                Ok(seed) => {
                    self.encounter.seed = Some(seed);
                    log::info!("Encounter seed from env: {}", seed);
                }
                Err(_) => log::warn!("Ignoring WRAITH_SEED={}", seed),
            }
        }
        if let Some(duration) = var("WRAITH_DURATION") {
            match duration.trim().parse() {
                Ok(duration) => {
                    self.simulation.duration = duration;
                    log::info!("Simulation duration from env: {}s", duration);
                }
                Err(_) => log::warn!("Ignoring WRAITH_DURATION={}", duration),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spawn.validate()?;
        self.encounter.validate()?;
        self.trap.validate()?;

        let sim = &self.simulation;
        if !sim.duration.is_finite() || sim.duration < 0.0 {
            return Err(invalid(format!(
                "simulation duration must be non-negative, got {}",
                sim.duration
            )));
        }
        if let Some(cue) = sim.timeline.iter().find(|cue| !cue.at.is_finite() || cue.at < 0.0) {
            return Err(invalid(format!("mode cue at {}s is out of range", cue.at)));
        }
        for visit in &sim.trap_visits {
            if !visit.enter.is_finite() || visit.enter < 0.0 || visit.exit < visit.enter {
                return Err(invalid(format!(
                    "trap visit [{}, {}] is out of range",
                    visit.enter, visit.exit
                )));
            }
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        log::info!("Wraith Configuration:");
        match &self.spawn.template {
            Some(template) => log::info!("  Template: {} ({:?} mode)", template, self.spawn.mode),
            None => log::info!("  Template: <unset>"),
        }
        log::info!(
            "  Encounter: spawn {}-{}s, chase {}-{}s, target '{}'",
            self.encounter.min_spawn_time,
            self.encounter.max_spawn_time,
            self.encounter.min_chase_time,
            self.encounter.max_chase_time,
            self.encounter.target_role
        );
        log::info!(
            "  Trap: {} members, countdown {}s, exit delay {}s",
            self.simulation.trap_members,
            self.trap.countdown,
            self.trap.exit_delay
        );
        log::info!(
            "  Simulation: {}s{}",
            self.simulation.duration,
            if self.simulation.fast_forward { " (fast-forward)" } else { "" }
        );
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path.display());
        }
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(LifecycleError::InvalidConfig(message))
}
