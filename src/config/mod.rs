//! Dashboard Configuration Module
//!
//! Backend connection, polling cadence and every agronomic threshold used by
//! the status classifier and health scorer, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `FARM_PULSE_CONFIG` environment variable (path to TOML file)
//! 2. `farm_pulse.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded config is passed explicitly to the components that need it;
//! there is no process-wide config singleton.

mod dashboard_config;
pub mod defaults;
pub mod validation;

pub use dashboard_config::*;
