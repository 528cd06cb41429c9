//! Plot Status Classification
//!
//! Deterministic, rule-based mapping from the latest soil reading (plus
//! optional vision metrics) to a discrete `PlotStatus`. Rules are evaluated
//! in a fixed order and the first match wins; signals are never combined.
//!
//! This is a fallback: when the backend supplies a status it is used as-is
//! and this classifier is not consulted (see `processing::enrichment`).

use crate::config::StatusThresholds;
use crate::types::{PlotStatus, SoilReading, VisionData};

/// Classify a plot with the built-in thresholds.
///
/// - No soil reading → `Offline`
/// - Critical: moisture outside [10, 35], pH outside [5.5, 8.0],
///   temperature > 40 °C, water stress > 70 %
/// - Warning: moisture outside [15, 30], pH outside [6.0, 7.5],
///   temperature outside [15, 35] °C, pests detected, irrigation failures
/// - Otherwise `Ok`
pub fn classify(reading: Option<&SoilReading>, vision: Option<&VisionData>) -> PlotStatus {
    classify_with(&StatusThresholds::default(), reading, vision)
}

/// Classify a plot with operator-tuned thresholds.
///
/// Absent fields are skipped, never read as zero. Band edges belong to the
/// band: a moisture of exactly 10.0 is not critical.
pub fn classify_with(
    t: &StatusThresholds,
    reading: Option<&SoilReading>,
    vision: Option<&VisionData>,
) -> PlotStatus {
    let Some(soil) = reading else {
        return PlotStatus::Offline;
    };

    // Critical rules, in precedence order
    if soil.moisture.is_some_and(|m| !t.moisture_critical.contains(m)) {
        return PlotStatus::Critical;
    }
    if soil.ph.is_some_and(|ph| !t.ph_critical.contains(ph)) {
        return PlotStatus::Critical;
    }
    if soil.temperature.is_some_and(|c| c > t.temperature_critical_max) {
        return PlotStatus::Critical;
    }
    if vision
        .and_then(|v| v.water_stress_level)
        .is_some_and(|ws| ws > t.water_stress_critical_pct)
    {
        return PlotStatus::Critical;
    }

    // Warning rules
    if soil.moisture.is_some_and(|m| !t.moisture_warning.contains(m)) {
        return PlotStatus::Warning;
    }
    if soil.ph.is_some_and(|ph| !t.ph_warning.contains(ph)) {
        return PlotStatus::Warning;
    }
    if soil.temperature.is_some_and(|c| !t.temperature_warning.contains(c)) {
        return PlotStatus::Warning;
    }
    if let Some(v) = vision {
        if v.pests_detected || v.irrigation_failures > 0 {
            return PlotStatus::Warning;
        }
    }

    PlotStatus::Ok
}
