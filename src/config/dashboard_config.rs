//! Dashboard Configuration - backend, polling and agronomic thresholds as TOML
//!
//! Every threshold used by the status classifier and health scorer is a field
//! here. Each struct implements `Default` with the built-in agronomic bands,
//! so an absent config file yields the stock behaviour.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `DashboardConfig::load()` which searches:
/// 1. `$FARM_PULSE_CONFIG` env var
/// 2. `./farm_pulse.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// REST backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Polling cadence
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Classification and scoring bands
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl DashboardConfig {
    /// Load configuration using the standard search order, then apply the
    /// `FARM_PULSE_API_TOKEN` override.
    pub fn load() -> Self {
        let mut config = Self::load_from_search_path();
        if let Ok(token) = std::env::var(defaults::API_TOKEN_ENV) {
            if !token.is_empty() {
                config.backend.api_token = Some(token);
            }
        }
        config
    }

    fn load_from_search_path() -> Self {
        // 1. Env var
        if let Ok(path) = std::env::var(defaults::CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded dashboard config from {}", defaults::CONFIG_PATH_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_PATH_ENV);
            }
        }

        // 2. Working directory
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded dashboard config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML (used by `farm-pulse config`).
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check that every band nests correctly and polling values are usable.
    ///
    /// All violations are collected so the operator sees them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.refresh.interval_secs == 0 {
            errors.push("refresh.interval_secs must be > 0".to_string());
        }
        if self.backend.timeout_secs == 0 {
            errors.push("backend.timeout_secs must be > 0".to_string());
        }
        if self.backend.base_url.trim().is_empty() {
            errors.push("backend.base_url must not be empty".to_string());
        }

        let s = &self.thresholds.status;
        Self::check_band(&s.moisture_critical, "status.moisture_critical", &mut errors);
        Self::check_band(&s.moisture_warning, "status.moisture_warning", &mut errors);
        Self::check_band(&s.ph_critical, "status.ph_critical", &mut errors);
        Self::check_band(&s.ph_warning, "status.ph_warning", &mut errors);
        Self::check_band(&s.temperature_warning, "status.temperature_warning", &mut errors);
        Self::check_nested(&s.moisture_warning, &s.moisture_critical, "status.moisture", &mut errors);
        Self::check_nested(&s.ph_warning, &s.ph_critical, "status.ph", &mut errors);
        if s.temperature_critical_max < s.temperature_warning.max {
            errors.push(format!(
                "status.temperature_critical_max ({:.2}) must be >= temperature_warning.max ({:.2})",
                s.temperature_critical_max, s.temperature_warning.max
            ));
        }

        let h = &self.thresholds.health;
        for (name, dim) in [
            ("health.moisture", &h.moisture),
            ("health.ph", &h.ph),
            ("health.temperature", &h.temperature),
        ] {
            Self::check_band(&dim.optimal, &format!("{name}.optimal"), &mut errors);
            Self::check_band(&dim.acceptable, &format!("{name}.acceptable"), &mut errors);
            Self::check_nested(&dim.optimal, &dim.acceptable, name, &mut errors);
            if dim.suboptimal_penalty < 0.0 || dim.out_of_range_penalty < 0.0 {
                errors.push(format!("{name}: penalties must be non-negative"));
            }
        }
        if h.ndvi_penalty_below > h.ndvi_bonus_min {
            errors.push(format!(
                "health.ndvi_penalty_below ({:.2}) must be <= ndvi_bonus_min ({:.2})",
                h.ndvi_penalty_below, h.ndvi_bonus_min
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_band(band: &Band, name: &str, errors: &mut Vec<String>) {
        if band.min > band.max {
            errors.push(format!(
                "{name}: min ({:.2}) must be <= max ({:.2})",
                band.min, band.max
            ));
        }
    }

    fn check_nested(inner: &Band, outer: &Band, name: &str, errors: &mut Vec<String>) {
        if inner.min < outer.min || inner.max > outer.max {
            errors.push(format!(
                "{name}: inner band [{:.2}, {:.2}] must lie within [{:.2}, {:.2}]",
                inner.min, inner.max, outer.min, outer.max
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Backend
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL including the API prefix, e.g. `https://farm.example/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    defaults::BACKEND_BASE_URL.to_string()
}
const fn default_timeout() -> u64 {
    defaults::BACKEND_HTTP_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

// ============================================================================
// Refresh
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Auto-refresh period while a farm is selected (seconds)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Events fetched per refresh
    #[serde(default = "default_events_limit")]
    pub recent_events_limit: u32,
}

const fn default_interval() -> u64 {
    defaults::AUTO_REFRESH_INTERVAL_SECS
}
const fn default_events_limit() -> u32 {
    defaults::RECENT_EVENTS_LIMIT
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            recent_events_limit: default_events_limit(),
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub status: StatusThresholds,
    #[serde(default)]
    pub health: HealthScoreBands,
}

/// Bands for the discrete status classifier. Outside a critical band is
/// `critical`; inside it but outside the warning band is `warning`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    /// Soil moisture (%)
    pub moisture_critical: Band,
    pub moisture_warning: Band,
    pub ph_critical: Band,
    pub ph_warning: Band,
    /// Soil temperature above this is critical (°C)
    pub temperature_critical_max: f64,
    pub temperature_warning: Band,
    /// Vision water stress above this is critical (%)
    pub water_stress_critical_pct: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            moisture_critical: Band::new(10.0, 35.0),
            moisture_warning: Band::new(15.0, 30.0),
            ph_critical: Band::new(5.5, 8.0),
            ph_warning: Band::new(6.0, 7.5),
            temperature_critical_max: 40.0,
            temperature_warning: Band::new(15.0, 35.0),
            water_stress_critical_pct: 70.0,
        }
    }
}

/// Scoring bands for one soil dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionBands {
    pub optimal: Band,
    pub acceptable: Band,
    /// Deducted when inside `acceptable` but outside `optimal`
    pub suboptimal_penalty: f64,
    /// Deducted when outside `acceptable`
    pub out_of_range_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthScoreBands {
    pub moisture: DimensionBands,
    pub ph: DimensionBands,
    pub temperature: DimensionBands,
    /// NDVI at or above this earns `ndvi_bonus`
    pub ndvi_bonus_min: f64,
    pub ndvi_bonus: f64,
    /// NDVI below this costs `ndvi_penalty`
    pub ndvi_penalty_below: f64,
    pub ndvi_penalty: f64,
    pub pest_penalty: f64,
    pub irrigation_failure_penalty: f64,
}

impl Default for HealthScoreBands {
    fn default() -> Self {
        Self {
            moisture: DimensionBands {
                optimal: Band::new(18.0, 28.0),
                acceptable: Band::new(14.0, 32.0),
                suboptimal_penalty: 10.0,
                out_of_range_penalty: 25.0,
            },
            ph: DimensionBands {
                optimal: Band::new(6.0, 7.5),
                acceptable: Band::new(5.5, 8.0),
                suboptimal_penalty: 10.0,
                out_of_range_penalty: 25.0,
            },
            temperature: DimensionBands {
                optimal: Band::new(18.0, 32.0),
                acceptable: Band::new(15.0, 38.0),
                suboptimal_penalty: 10.0,
                out_of_range_penalty: 20.0,
            },
            ndvi_bonus_min: 0.6,
            ndvi_bonus: 10.0,
            ndvi_penalty_below: 0.4,
            ndvi_penalty: 15.0,
            pest_penalty: 15.0,
            irrigation_failure_penalty: 10.0,
        }
    }
}
