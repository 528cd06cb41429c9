//! Plot (talhão) records, sensor readings and the derived-value wrapper

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Plot Status
// ============================================================================

/// Discrete plot condition shown on cards, maps and badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStatus {
    Ok,
    Warning,
    Critical,
    Offline,
}

impl PlotStatus {
    pub const ALL: [Self; 4] = [Self::Ok, Self::Warning, Self::Critical, Self::Offline];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for PlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Derived values
// ============================================================================

/// A value that either came from the backend or was computed locally as a
/// fallback from the latest readings.
///
/// Upstream always wins: `Computed` is only produced when the backend did not
/// supply the field at all. Presence decides, not truthiness, so an upstream
/// health score of `0.0` stays `Authoritative`. Upstream values are stored
/// as sent and never clamped, so a backend score outside 0-100 is kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum Derived<T> {
    Authoritative(T),
    Computed(T),
}

impl<T: Copy> Derived<T> {
    /// Resolve an optional upstream value, computing the fallback lazily.
    pub fn resolve(upstream: Option<T>, fallback: impl FnOnce() -> T) -> Self {
        match upstream {
            Some(v) => Self::Authoritative(v),
            None => Self::Computed(fallback()),
        }
    }

    pub const fn value(&self) -> T {
        match self {
            Self::Authoritative(v) | Self::Computed(v) => *v,
        }
    }

    pub const fn is_authoritative(&self) -> bool {
        matches!(self, Self::Authoritative(_))
    }
}

// ============================================================================
// Readings
// ============================================================================

/// Timestamped soil probe reading. Every scalar may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    /// Volumetric moisture (%)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub moisture: Option<f64>,
    /// Soil temperature (°C)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub temperature: Option<f64>,
    /// Electrical conductivity
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub ec: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub ph: Option<f64>,
    /// Nitrogen (ppm)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub nitrogen: Option<f64>,
    /// Phosphorus (ppm)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub phosphorus: Option<f64>,
    /// Potassium (ppm)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub potassium: Option<f64>,
}

/// Computer-vision metrics for a plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionData {
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    #[serde(default)]
    pub irrigation_failures: u32,
    /// Water stress (%)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub water_stress_level: Option<f64>,
    #[serde(default)]
    pub over_irrigation_detected: bool,
    #[serde(default)]
    pub fruit_count: u32,
    /// Average fruit size (mm)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub avg_fruit_size: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub flowering_percentage: Option<f64>,
    #[serde(default)]
    pub pests_detected: bool,
    #[serde(default)]
    pub pest_type: Option<String>,
    /// Chlorophyll (%)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub chlorophyll_level: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub ndvi: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub maturity_index: Option<f64>,
}

// ============================================================================
// Plot records
// ============================================================================

/// Plot as delivered by the backend, with optional upstream-derived fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotRecord {
    pub id: String,
    pub farm_id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Area (ha)
    #[serde(default, deserialize_with = "super::decimal::f64_or_text")]
    pub area: f64,
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub variety: Option<String>,
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub tree_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub status: Option<PlotStatus>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub current_soil_reading: Option<SoilReading>,
    #[serde(default)]
    pub current_vision_data: Option<VisionData>,
    #[serde(default)]
    pub sensors_count: Option<u32>,
    /// Estimated yield (kg)
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub estimated_yield: Option<f64>,
}

const fn default_true() -> bool {
    true
}

/// Plot enriched with a resolved status and health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    #[serde(flatten)]
    pub record: PlotRecord,
    pub derived_status: Derived<PlotStatus>,
    pub derived_health: Derived<f64>,
}

impl Plot {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub const fn status(&self) -> PlotStatus {
        self.derived_status.value()
    }

    pub const fn health_score(&self) -> f64 {
        self.derived_health.value()
    }

    pub const fn soil(&self) -> Option<&SoilReading> {
        self.record.current_soil_reading.as_ref()
    }

    pub const fn vision(&self) -> Option<&VisionData> {
        self.record.current_vision_data.as_ref()
    }
}
