//! Plot enrichment: resolve status and health score for each backend record.
//!
//! Upstream values always win. The classifier and scorer only run for the
//! fields the backend left out, and the result records which path was taken.

use crate::config::ThresholdConfig;
use crate::types::{Derived, Plot, PlotRecord};

use super::{classify_with, score_with};

/// Enrich one plot record.
///
/// Only locally computed scores are clamped to 0-100. An upstream health score
/// passes through untouched, even when it lies outside that range.
pub fn enrich(record: PlotRecord, thresholds: &ThresholdConfig) -> Plot {
    let soil = record.current_soil_reading.as_ref();
    let vision = record.current_vision_data.as_ref();

    let derived_status =
        Derived::resolve(record.status, || classify_with(&thresholds.status, soil, vision));
    let derived_health = Derived::resolve(record.health_score, || {
        score_with(&thresholds.health, soil, vision)
    });

    Plot {
        record,
        derived_status,
        derived_health,
    }
}

/// Enrich a whole batch, preserving order.
pub fn enrich_all(records: Vec<PlotRecord>, thresholds: &ThresholdConfig) -> Vec<Plot> {
    records.into_iter().map(|r| enrich(r, thresholds)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlotStatus, SoilReading, VisionData};

    fn record(id: &str) -> PlotRecord {
        PlotRecord {
            id: id.to_string(),
            farm_id: "farm-1".to_string(),
            name: format!("Talhao {id}"),
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn computes_when_upstream_absent() {
        let mut r = record("p1");
        r.current_soil_reading = Some(SoilReading {
            moisture: Some(5.0),
            ph: Some(7.0),
            ..Default::default()
        });
        r.current_vision_data = Some(VisionData {
            ndvi: Some(0.7),
            ..Default::default()
        });

        let plot = enrich(r, &ThresholdConfig::default());
        assert_eq!(plot.derived_status, Derived::Computed(PlotStatus::Critical));
        assert_eq!(plot.derived_health, Derived::Computed(85.0));
    }

    #[test]
    fn upstream_values_are_authoritative() {
        let mut r = record("p1");
        r.status = Some(PlotStatus::Ok);
        r.health_score = Some(0.0);
        r.current_soil_reading = Some(SoilReading {
            moisture: Some(5.0),
            ..Default::default()
        });

        let plot = enrich(r, &ThresholdConfig::default());
        assert_eq!(plot.derived_status, Derived::Authoritative(PlotStatus::Ok));
        assert_eq!(plot.derived_health, Derived::Authoritative(0.0));
    }

    #[test]
    fn out_of_range_upstream_score_is_not_clamped() {
        let mut r = record("p1");
        r.health_score = Some(140.0);
        r.current_soil_reading = Some(SoilReading {
            moisture: Some(22.0),
            ph: Some(6.5),
            ..Default::default()
        });

        let plot = enrich(r, &ThresholdConfig::default());
        assert_eq!(plot.derived_health, Derived::Authoritative(140.0));
        assert!((plot.health_score() - 140.0).abs() < f64::EPSILON);

        let mut negative = record("p2");
        negative.health_score = Some(-3.5);
        let plot = enrich(negative, &ThresholdConfig::default());
        assert_eq!(plot.derived_health, Derived::Authoritative(-3.5));
    }

    #[test]
    fn no_reading_is_offline_and_unknown() {
        let plot = enrich(record("p1"), &ThresholdConfig::default());
        assert_eq!(plot.status(), PlotStatus::Offline);
        assert!((plot.health_score() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn batch_keeps_order() {
        let plots = enrich_all(
            vec![record("a"), record("b"), record("c")],
            &ThresholdConfig::default(),
        );
        let ids: Vec<&str> = plots.iter().map(Plot::id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}
