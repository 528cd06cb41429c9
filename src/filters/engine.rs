//! Filter engine: apply `GlobalFilters` criteria to plots or production rows.
//!
//! A record passes when it satisfies every active dimension (conjunction).
//! Inactive dimensions (empty set, open range, `all` harvest window, empty
//! search) never exclude anything. Output keeps input order.

use serde::{Deserialize, Serialize};

use super::categories::{
    caliber_from_size, criticality_from_status, irrigation_from_moisture, stage_from_vision,
};
use crate::analytics::{aggregate, PlotProduction};
use crate::types::{
    CriticalityLevel, FruitCaliber, GlobalFilters, IrrigationStatus, MangoVariety, NumericRange,
    Plot, ProductionStage, SoilReading,
};

// ============================================================================
// Record facets
// ============================================================================

/// What a record knows about one filter dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Facet<T> {
    /// The record type has no such dimension; the filter ignores it.
    NotTracked,
    /// Tracked, but this record has no value.
    Missing,
    Value(T),
}

impl<T> From<Option<T>> for Facet<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

/// A record the filter engine can evaluate.
///
/// Dimensions a record type does not carry keep the `NotTracked` default.
pub trait FilterRecord {
    /// Lower-case-insensitive haystacks for free-text search.
    fn search_fields(&self) -> Vec<&str>;

    fn plot_id(&self) -> &str;

    fn variety(&self) -> Facet<MangoVariety> {
        Facet::NotTracked
    }
    fn production_stage(&self) -> Facet<ProductionStage> {
        Facet::NotTracked
    }
    fn criticality(&self) -> Facet<CriticalityLevel> {
        Facet::NotTracked
    }
    fn caliber(&self) -> Facet<FruitCaliber> {
        Facet::NotTracked
    }
    fn irrigation_status(&self) -> Facet<IrrigationStatus> {
        Facet::NotTracked
    }
    /// Estimated yield (kg)
    fn estimated_yield(&self) -> Facet<f64> {
        Facet::NotTracked
    }
    fn moisture(&self) -> Facet<f64> {
        Facet::NotTracked
    }
    fn ph(&self) -> Facet<f64> {
        Facet::NotTracked
    }
    fn nitrogen(&self) -> Facet<f64> {
        Facet::NotTracked
    }
    fn phosphorus(&self) -> Facet<f64> {
        Facet::NotTracked
    }
    fn potassium(&self) -> Facet<f64> {
        Facet::NotTracked
    }
    fn days_to_harvest(&self) -> Facet<i64> {
        Facet::NotTracked
    }
}

impl Plot {
    fn soil_facet(&self, field: impl Fn(&SoilReading) -> Option<f64>) -> Facet<f64> {
        self.soil().and_then(field).into()
    }
}

impl FilterRecord for Plot {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.record.name.as_str(), self.record.id.as_str()];
        if let Some(code) = &self.record.code {
            fields.push(code);
        }
        fields
    }

    fn plot_id(&self) -> &str {
        self.id()
    }

    fn variety(&self) -> Facet<MangoVariety> {
        self.record.variety.as_deref().map(MangoVariety::from_label).into()
    }

    fn production_stage(&self) -> Facet<ProductionStage> {
        self.vision().and_then(stage_from_vision).into()
    }

    fn criticality(&self) -> Facet<CriticalityLevel> {
        Facet::Value(criticality_from_status(self.status()))
    }

    fn caliber(&self) -> Facet<FruitCaliber> {
        self.vision()
            .and_then(|v| v.avg_fruit_size)
            .map(caliber_from_size)
            .into()
    }

    fn irrigation_status(&self) -> Facet<IrrigationStatus> {
        self.soil()
            .and_then(|s| s.moisture)
            .map(irrigation_from_moisture)
            .into()
    }

    fn estimated_yield(&self) -> Facet<f64> {
        self.record.estimated_yield.into()
    }

    fn moisture(&self) -> Facet<f64> {
        self.soil_facet(|s| s.moisture)
    }

    fn ph(&self) -> Facet<f64> {
        self.soil_facet(|s| s.ph)
    }

    fn nitrogen(&self) -> Facet<f64> {
        self.soil_facet(|s| s.nitrogen)
    }

    fn phosphorus(&self) -> Facet<f64> {
        self.soil_facet(|s| s.phosphorus)
    }

    fn potassium(&self) -> Facet<f64> {
        self.soil_facet(|s| s.potassium)
    }
}

impl FilterRecord for PlotProduction {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.plot_name.as_str(), self.plot_id.as_str()];
        if let Some(code) = &self.plot_code {
            fields.push(code);
        }
        fields
    }

    fn plot_id(&self) -> &str {
        &self.plot_id
    }

    fn production_stage(&self) -> Facet<ProductionStage> {
        self.production_stage.into()
    }

    fn criticality(&self) -> Facet<CriticalityLevel> {
        Facet::Value(criticality_from_status(self.status))
    }

    fn caliber(&self) -> Facet<FruitCaliber> {
        self.fruit_caliber
            .or_else(|| self.avg_fruit_size.map(caliber_from_size))
            .into()
    }

    fn estimated_yield(&self) -> Facet<f64> {
        Facet::Value(self.estimated_yield_kg)
    }

    fn days_to_harvest(&self) -> Facet<i64> {
        self.days_to_harvest.into()
    }
}

// ============================================================================
// Predicates
// ============================================================================

fn set_admits<T: PartialEq>(set: &[T], facet: Facet<T>) -> bool {
    if set.is_empty() {
        return true;
    }
    match facet {
        Facet::NotTracked => true,
        Facet::Missing => false,
        Facet::Value(v) => set.contains(&v),
    }
}

/// An unknown value cannot violate a bound.
fn range_admits(range: &NumericRange, facet: Facet<f64>) -> bool {
    match facet {
        Facet::Value(v) => range.admits(v),
        Facet::NotTracked | Facet::Missing => true,
    }
}

fn search_admits<R: FilterRecord>(record: &R, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// True when `record` satisfies every active dimension of `criteria`.
pub fn matches<R: FilterRecord>(record: &R, criteria: &GlobalFilters) -> bool {
    if !search_admits(record, &criteria.search) {
        return false;
    }
    if !criteria.plots.is_empty() && !criteria.plots.iter().any(|id| id == record.plot_id()) {
        return false;
    }

    let sets_ok = set_admits(&criteria.varieties, record.variety())
        && set_admits(&criteria.production_stages, record.production_stage())
        && set_admits(&criteria.criticality_levels, record.criticality())
        && set_admits(&criteria.calibers, record.caliber())
        && set_admits(&criteria.irrigation_status, record.irrigation_status());
    if !sets_ok {
        return false;
    }

    let ranges_ok = range_admits(&criteria.yield_range, record.estimated_yield())
        && range_admits(&criteria.moisture_range, record.moisture())
        && range_admits(&criteria.ph_range, record.ph())
        && range_admits(&criteria.nitrogen_range, record.nitrogen())
        && range_admits(&criteria.phosphorus_range, record.phosphorus())
        && range_admits(&criteria.potassium_range, record.potassium());
    if !ranges_ok {
        return false;
    }

    match (criteria.harvest_window.max_days(), record.days_to_harvest()) {
        (Some(max), Facet::Value(days)) => days <= i64::from(max),
        _ => true,
    }
}

/// Stable filter: the records that match, in input order.
pub fn filter<R: FilterRecord + Clone>(records: &[R], criteria: &GlobalFilters) -> Vec<R> {
    records
        .iter()
        .filter(|r| matches(*r, criteria))
        .cloned()
        .collect()
}

// ============================================================================
// Summary
// ============================================================================

/// Before/after totals for the filter bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub total_plots: usize,
    pub filtered_plots: usize,
    pub total_trees: u64,
    pub filtered_trees: u64,
    pub total_yield: f64,
    pub filtered_yield: f64,
}

impl FilterSummary {
    /// Filter `all` and aggregate both sets from scratch.
    pub fn compute(all: &[Plot], criteria: &GlobalFilters) -> Self {
        let filtered = filter(all, criteria);
        let before = aggregate(all, &[]);
        let after = aggregate(&filtered, &[]);
        Self {
            total_plots: before.total_plots,
            filtered_plots: after.total_plots,
            total_trees: before.total_trees,
            filtered_trees: after.total_trees,
            total_yield: before.estimated_yield,
            filtered_yield: after.estimated_yield,
        }
    }
}
