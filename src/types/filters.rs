//! Global filter criteria shared by plot and production views
//!
//! Every dimension is open by default: an empty set or an unbounded range
//! places no constraint on the records being filtered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{FruitCaliber, ProductionStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MangoVariety {
    TommyAtkins,
    Kent,
    Keitt,
    Palmer,
    Haden,
    Other,
}

impl MangoVariety {
    /// Map a free-form variety label ("Tommy Atkins", "kent") to a known
    /// variety. Unrecognised labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "tommy_atkins" | "tommy" => Self::TommyAtkins,
            "kent" => Self::Kent,
            "keitt" => Self::Keitt,
            "palmer" => Self::Palmer,
            "haden" => Self::Haden,
            _ => Self::Other,
        }
    }
}

/// Operational criticality, derived from plot status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    Normal,
    Attention,
    Critical,
    Emergency,
}

/// Irrigation condition, derived from soil moisture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationStatus {
    Under,
    Optimal,
    Excessive,
}

// ============================================================================
// Numeric range
// ============================================================================

/// Inclusive numeric range with independently optional bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    pub const OPEN: Self = Self { min: None, max: None };

    pub const fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub const fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub const fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// True unless a present bound is violated.
    pub fn admits(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// Harvest window
// ============================================================================

/// Upper bound on days-to-harvest. Serialized as `"all"` or `"<n>d"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HarvestWindow {
    #[default]
    All,
    WithinDays(u32),
}

impl HarvestWindow {
    pub const fn max_days(self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::WithinDays(d) => Some(d),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid harvest window '{0}' (expected 'all' or '<days>d')")]
pub struct HarvestWindowParseError(String);

impl FromStr for HarvestWindow {
    type Err = HarvestWindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.strip_suffix('d')
            .and_then(|n| n.parse::<u32>().ok())
            .map(Self::WithinDays)
            .ok_or_else(|| HarvestWindowParseError(s.to_string()))
    }
}

impl TryFrom<String> for HarvestWindow {
    type Error = HarvestWindowParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HarvestWindow> for String {
    fn from(value: HarvestWindow) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HarvestWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::WithinDays(d) => write!(f, "{d}d"),
        }
    }
}

// ============================================================================
// Global filters
// ============================================================================

/// Active filter predicates across all dashboard views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalFilters {
    /// Case-insensitive substring over plot name / id / code
    pub search: String,
    pub plots: Vec<String>,
    pub varieties: Vec<MangoVariety>,
    pub production_stages: Vec<ProductionStage>,
    pub criticality_levels: Vec<CriticalityLevel>,
    pub calibers: Vec<FruitCaliber>,
    pub irrigation_status: Vec<IrrigationStatus>,
    pub harvest_window: HarvestWindow,
    /// Estimated yield (kg)
    pub yield_range: NumericRange,
    pub moisture_range: NumericRange,
    pub ph_range: NumericRange,
    pub nitrogen_range: NumericRange,
    pub phosphorus_range: NumericRange,
    pub potassium_range: NumericRange,
}

/// Partial filter overlay used by smart filters: only `Some` fields replace
/// the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOverlay {
    pub plots: Option<Vec<String>>,
    pub varieties: Option<Vec<MangoVariety>>,
    pub production_stages: Option<Vec<ProductionStage>>,
    pub criticality_levels: Option<Vec<CriticalityLevel>>,
    pub calibers: Option<Vec<FruitCaliber>>,
    pub irrigation_status: Option<Vec<IrrigationStatus>>,
    pub harvest_window: Option<HarvestWindow>,
    pub yield_range: Option<NumericRange>,
    pub moisture_range: Option<NumericRange>,
    pub ph_range: Option<NumericRange>,
}

impl GlobalFilters {
    /// True when no dimension constrains anything.
    pub fn is_open(&self) -> bool {
        *self == Self::default()
    }

    /// Return a copy with the overlay's fields applied on top.
    #[must_use]
    pub fn overlaid(&self, overlay: &FilterOverlay) -> Self {
        let mut next = self.clone();
        if let Some(v) = &overlay.plots {
            next.plots.clone_from(v);
        }
        if let Some(v) = &overlay.varieties {
            next.varieties.clone_from(v);
        }
        if let Some(v) = &overlay.production_stages {
            next.production_stages.clone_from(v);
        }
        if let Some(v) = &overlay.criticality_levels {
            next.criticality_levels.clone_from(v);
        }
        if let Some(v) = &overlay.calibers {
            next.calibers.clone_from(v);
        }
        if let Some(v) = &overlay.irrigation_status {
            next.irrigation_status.clone_from(v);
        }
        if let Some(v) = overlay.harvest_window {
            next.harvest_window = v;
        }
        if let Some(v) = overlay.yield_range {
            next.yield_range = v;
        }
        if let Some(v) = overlay.moisture_range {
            next.moisture_range = v;
        }
        if let Some(v) = overlay.ph_range {
            next.ph_range = v;
        }
        next
    }
}
