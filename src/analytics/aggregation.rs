//! Farm-level summary statistics over the enriched plot set.

use serde::{Deserialize, Serialize};

use crate::types::{Alert, AlertCategory, Plot, PlotStatus, SoilReading};

/// Summary shown on the farm overview.
///
/// Always recomputed from the full plot/alert collections; never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmStats {
    pub total_plots: usize,
    pub ok_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    pub offline_count: usize,
    /// Mean over online plots that reported moisture (%)
    pub avg_moisture: f64,
    /// Mean over online plots that reported temperature (°C)
    pub avg_temperature: f64,
    /// Mean over online plots that reported pH
    pub avg_ph: f64,
    pub active_alerts: usize,
    pub irrigation_issues: usize,
    pub total_trees: u64,
    /// Sum of per-plot estimated yield (kg)
    pub estimated_yield: f64,
    /// Mean plot health score, rounded to the nearest integer
    pub health_score: f64,
}

impl FarmStats {
    pub const fn count_for(&self, status: PlotStatus) -> usize {
        match status {
            PlotStatus::Ok => self.ok_count,
            PlotStatus::Warning => self.warning_count,
            PlotStatus::Critical => self.critical_count,
            PlotStatus::Offline => self.offline_count,
        }
    }
}

/// Reduce plots and alerts into `FarmStats`. Pure: no clock, no I/O.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(plots: &[Plot], alerts: &[Alert]) -> FarmStats {
    if plots.is_empty() {
        return FarmStats::default();
    }

    let active: Vec<&Alert> = alerts.iter().filter(|a| a.is_active()).collect();
    let mut stats = FarmStats {
        total_plots: plots.len(),
        active_alerts: active.len(),
        irrigation_issues: active
            .iter()
            .filter(|a| a.category == AlertCategory::Irrigation)
            .count(),
        ..FarmStats::default()
    };

    for plot in plots {
        match plot.status() {
            PlotStatus::Ok => stats.ok_count += 1,
            PlotStatus::Warning => stats.warning_count += 1,
            PlotStatus::Critical => stats.critical_count += 1,
            PlotStatus::Offline => stats.offline_count += 1,
        }
        stats.total_trees += u64::from(plot.record.tree_count);
        stats.estimated_yield += plot.record.estimated_yield.unwrap_or(0.0);
    }

    let online: Vec<&Plot> = plots
        .iter()
        .filter(|p| p.status() != PlotStatus::Offline)
        .collect();
    stats.avg_moisture = mean_of_present(&online, |s| s.moisture);
    stats.avg_temperature = mean_of_present(&online, |s| s.temperature);
    stats.avg_ph = mean_of_present(&online, |s| s.ph);

    let health_sum: f64 = plots.iter().map(Plot::health_score).sum();
    stats.health_score = (health_sum / plots.len() as f64).round();

    stats
}

/// Mean of one soil field over the plots that report it; 0 when none do.
#[allow(clippy::cast_precision_loss)]
fn mean_of_present(plots: &[&Plot], field: impl Fn(&SoilReading) -> Option<f64>) -> f64 {
    let values: Vec<f64> = plots
        .iter()
        .filter_map(|p| p.soil().and_then(&field))
        .collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
