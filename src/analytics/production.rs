//! Production analytics: per-plot production rows and the farm roll-up.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::backend::{FarmDataSource, SourceError};
use crate::config::defaults;
use crate::types::{
    FarmSummary, FruitCaliber, PlotStatus, ProductionSnapshot, ProductionStage, RiskLevel,
};

/// Normalised production row for one plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotProduction {
    pub plot_id: String,
    pub plot_name: String,
    pub plot_code: Option<String>,
    pub status: PlotStatus,
    pub health_score: f64,
    pub production_stage: Option<ProductionStage>,
    pub total_fruits: u64,
    /// Average fruit size (mm)
    pub avg_fruit_size: Option<f64>,
    pub fruit_caliber: Option<FruitCaliber>,
    pub estimated_yield_kg: f64,
    pub estimated_yield_tons: f64,
    pub days_to_harvest: Option<i64>,
    pub harvest_start_date: Option<NaiveDate>,
    pub harvest_end_date: Option<NaiveDate>,
    pub risk_level: Option<RiskLevel>,
    pub risk_factors: Vec<String>,
    pub flowering_percentage: Option<f64>,
}

impl PlotProduction {
    /// Fill the gaps of a backend snapshot with display defaults.
    pub fn from_snapshot(snapshot: ProductionSnapshot) -> Self {
        Self {
            plot_id: snapshot.plot_id,
            plot_name: snapshot
                .plot_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| defaults::FALLBACK_PLOT_NAME.to_string()),
            plot_code: snapshot.plot_code.filter(|c| !c.is_empty()),
            status: snapshot.status.unwrap_or(PlotStatus::Offline),
            health_score: snapshot.health_score.unwrap_or(0.0),
            production_stage: snapshot.production_stage,
            total_fruits: snapshot.total_fruits.unwrap_or(0),
            avg_fruit_size: snapshot.avg_fruit_size,
            fruit_caliber: snapshot.fruit_caliber,
            estimated_yield_kg: snapshot.estimated_yield_kg.unwrap_or(0.0),
            estimated_yield_tons: snapshot.estimated_yield_tons.unwrap_or(0.0),
            days_to_harvest: snapshot.days_to_harvest,
            harvest_start_date: snapshot.harvest_start_date,
            harvest_end_date: snapshot.harvest_end_date,
            risk_level: snapshot.risk_level,
            risk_factors: snapshot.risk_factors,
            flowering_percentage: snapshot.flowering_percentage,
        }
    }
}

/// Farm-level production roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmProductionStats {
    pub total_plots: usize,
    pub total_trees: u64,
    pub total_fruits: u64,
    pub avg_fruits_per_tree: f64,
    pub total_estimated_yield_kg: f64,
    pub total_estimated_yield_tons: f64,
    pub avg_health_score: f64,
    pub plots_by_stage: BTreeMap<ProductionStage, usize>,
    pub plots_by_risk: BTreeMap<RiskLevel, usize>,
    pub harvest_ready: usize,
    pub in_progress: usize,
}

impl FarmProductionStats {
    /// Reduce production rows. Tree totals come from the farm summary since
    /// snapshots do not carry tree counts.
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(rows: &[PlotProduction], summary: Option<&FarmSummary>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            total_plots: rows.len(),
            total_trees: summary.map_or(0, |s| s.total_trees),
            ..Self::default()
        };
        let mut health_sum = 0.0;

        for row in rows {
            stats.total_fruits += row.total_fruits;
            stats.total_estimated_yield_kg += row.estimated_yield_kg;
            health_sum += row.health_score;

            if let Some(stage) = row.production_stage {
                *stats.plots_by_stage.entry(stage).or_default() += 1;
                if stage == ProductionStage::HarvestReady {
                    stats.harvest_ready += 1;
                } else if stage.is_in_progress() {
                    stats.in_progress += 1;
                }
            }
            if let Some(risk) = row.risk_level {
                *stats.plots_by_risk.entry(risk).or_default() += 1;
            }
        }

        stats.total_estimated_yield_tons = stats.total_estimated_yield_kg / 1000.0;
        stats.avg_health_score = health_sum / rows.len() as f64;
        if stats.total_trees > 0 {
            stats.avg_fruits_per_tree = stats.total_fruits as f64 / stats.total_trees as f64;
        }
        stats
    }
}

/// Everything the production view needs for one farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionView {
    pub rows: Vec<PlotProduction>,
    pub summary: FarmSummary,
    pub stats: FarmProductionStats,
}

/// Fetch latest snapshots and the farm summary concurrently and reduce them.
pub async fn load_production(
    source: &dyn FarmDataSource,
    farm_id: &str,
) -> Result<ProductionView, SourceError> {
    let (snapshots, summary) = tokio::try_join!(
        source.list_latest_snapshots(farm_id),
        source.get_farm_summary(farm_id),
    )?;

    let rows: Vec<PlotProduction> = snapshots
        .into_iter()
        .map(PlotProduction::from_snapshot)
        .collect();
    let stats = FarmProductionStats::compute(&rows, Some(&summary));
    tracing::debug!(farm_id, plots = rows.len(), "production analytics loaded");

    Ok(ProductionView {
        rows,
        summary,
        stats,
    })
}
