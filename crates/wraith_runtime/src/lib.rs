//! Wraith runtime
//!
//! Configuration loading and the headless simulation that drives the
//! fade, spawn, encounter and trap crates together.

pub mod config;
pub mod simulation;

pub mod prelude {
    pub use crate::config::{ConfigError, ModeCue, SimulationConfig, TrapVisit, WraithConfig};
    pub use crate::simulation::{Simulation, SimulationReport, PLAYER_ENTITY};
}

pub use prelude::*;
