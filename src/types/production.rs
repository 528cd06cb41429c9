//! Production analytics records: per-plot snapshots and farm summary
//!
//! The backend reports stages, calibers and risk levels with Portuguese
//! identifiers (`pronto_colheita`, `grande`, `alto`); the filter layer uses
//! English ones. Both spellings deserialize into the same enums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::PlotStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStage {
    #[serde(alias = "floracao")]
    Flowering,
    #[serde(alias = "frutificacao")]
    FruitSetting,
    #[serde(alias = "crescimento")]
    Growth,
    #[serde(alias = "maturacao")]
    Maturation,
    #[serde(alias = "pronto_colheita")]
    HarvestReady,
}

impl ProductionStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flowering => "flowering",
            Self::FruitSetting => "fruit_setting",
            Self::Growth => "growth",
            Self::Maturation => "maturation",
            Self::HarvestReady => "harvest_ready",
        }
    }

    /// Stages between fruit set and harvest readiness.
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::FruitSetting | Self::Growth | Self::Maturation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitCaliber {
    #[serde(alias = "pequeno")]
    Small,
    #[serde(alias = "medio")]
    Medium,
    #[serde(alias = "grande")]
    Large,
    #[serde(alias = "extra_grande")]
    ExtraLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[serde(alias = "baixo")]
    Low,
    #[serde(alias = "medio")]
    Medium,
    #[serde(alias = "alto")]
    High,
    #[serde(alias = "critico")]
    Critical,
}

/// Latest production snapshot for one plot, as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    pub plot_id: String,
    #[serde(default)]
    pub snapshot_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<PlotStatus>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub production_stage: Option<ProductionStage>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub flowering_percentage: Option<f64>,
    #[serde(default)]
    pub total_fruits: Option<u64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub avg_fruit_size: Option<f64>,
    #[serde(default)]
    pub fruit_caliber: Option<FruitCaliber>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub estimated_yield_kg: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub estimated_yield_tons: Option<f64>,
    #[serde(default)]
    pub harvest_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub harvest_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_to_harvest: Option<i64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub plot_name: Option<String>,
    #[serde(default)]
    pub plot_code: Option<String>,
}

/// Backend-computed farm summary used for tree totals in production stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmSummary {
    pub farm_id: String,
    #[serde(default)]
    pub farm_name: String,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub total_area: Option<f64>,
    #[serde(default)]
    pub total_plots: u32,
    #[serde(default)]
    pub total_trees: u64,
    #[serde(default)]
    pub total_sensors: u32,
    #[serde(default)]
    pub sensors_online: u32,
    #[serde(default)]
    pub sensors_offline: u32,
    #[serde(default)]
    pub active_alerts: u32,
    #[serde(default, deserialize_with = "super::decimal::f64_or_text")]
    pub health_score: f64,
    #[serde(default, deserialize_with = "super::decimal::f64_or_text")]
    pub estimated_yield_kg: f64,
}
