//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery. Config structs use these as
//! their `Default` values, so a missing config file reproduces them exactly.

// ============================================================================
// Backend
// ============================================================================

/// Base URL of the REST backend when neither config nor CLI supplies one.
pub const BACKEND_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP client timeout for backend requests (seconds).
pub const BACKEND_HTTP_TIMEOUT_SECS: u64 = 30;

/// Environment variable that overrides `backend.api_token`.
pub const API_TOKEN_ENV: &str = "FARM_PULSE_API_TOKEN";

/// Environment variable pointing at a TOML config file.
pub const CONFIG_PATH_ENV: &str = "FARM_PULSE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "farm_pulse.toml";

// ============================================================================
// Polling
// ============================================================================

/// Interval between automatic refreshes of the selected farm (seconds).
pub const AUTO_REFRESH_INTERVAL_SECS: u64 = 30;

/// Number of recent events fetched with every farm refresh.
pub const RECENT_EVENTS_LIMIT: u32 = 10;

// ============================================================================
// Health scoring
// ============================================================================

/// Score reported for a plot with no soil reading ("unknown", not "bad").
pub const UNKNOWN_HEALTH_SCORE: f64 = 50.0;

/// Starting score before penalties and bonuses.
pub const MAX_HEALTH_SCORE: f64 = 100.0;

// ============================================================================
// Plot detail
// ============================================================================

/// Yield estimate per counted fruit (kg), used when the backend has no
/// production estimate for a plot.
pub const YIELD_KG_PER_FRUIT: f64 = 0.35;

// ============================================================================
// Production analytics
// ============================================================================

/// Display name used when a production snapshot has no plot name.
pub const FALLBACK_PLOT_NAME: &str = "Talhao";
