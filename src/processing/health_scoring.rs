//! Health Scoring Module
//!
//! Deterministic, rule-based 0-100 health score for a plot, computed from the
//! latest soil reading and optional vision metrics. Used only when the backend
//! did not supply a score of its own.

use crate::config::{defaults, DimensionBands, HealthScoreBands};
use crate::types::{SoilReading, VisionData};

/// Calculate a plot health score (0-100) with the built-in bands.
///
/// # Scoring Algorithm
///
/// Start at 100 and apply additive adjustments, never averaged:
/// - Moisture: optimal 18-28 % → 0, acceptable 14-32 % → −10, else −25
/// - pH: optimal 6.0-7.5 → 0, acceptable 5.5-8.0 → −10, else −25
/// - Temperature: optimal 18-32 °C → 0, acceptable 15-38 °C → −10, else −20
/// - NDVI ≥ 0.6 → +10, NDVI < 0.4 → −15
/// - Pests detected → −15, irrigation failures → −10
///
/// Absent fields contribute nothing. A plot with no soil reading scores 50
/// ("unknown", not "bad"). The result is clamped to [0, 100] and rounded to
/// one decimal place, so fractional operator-tuned penalties survive.
pub fn score(reading: Option<&SoilReading>, vision: Option<&VisionData>) -> f64 {
    score_with(&HealthScoreBands::default(), reading, vision)
}

/// Calculate a plot health score with operator-tuned bands.
pub fn score_with(
    bands: &HealthScoreBands,
    reading: Option<&SoilReading>,
    vision: Option<&VisionData>,
) -> f64 {
    let Some(soil) = reading else {
        return defaults::UNKNOWN_HEALTH_SCORE;
    };

    let mut total = defaults::MAX_HEALTH_SCORE;
    total -= dimension_penalty(&bands.moisture, soil.moisture);
    total -= dimension_penalty(&bands.ph, soil.ph);
    total -= dimension_penalty(&bands.temperature, soil.temperature);

    if let Some(v) = vision {
        total += vision_adjustment(bands, v);
    }

    let clamped = total.clamp(0.0, defaults::MAX_HEALTH_SCORE);
    tracing::trace!(raw = total, score = clamped, "health score computed");

    (clamped * 10.0).round() / 10.0
}

/// Penalty for one soil dimension; `None` means the sensor did not report it.
fn dimension_penalty(dim: &DimensionBands, value: Option<f64>) -> f64 {
    match value {
        None => 0.0,
        Some(v) if dim.optimal.contains(v) => 0.0,
        Some(v) if dim.acceptable.contains(v) => dim.suboptimal_penalty,
        Some(_) => dim.out_of_range_penalty,
    }
}

/// Net bonus/penalty from vision metrics.
fn vision_adjustment(bands: &HealthScoreBands, vision: &VisionData) -> f64 {
    let mut delta = 0.0;

    if let Some(ndvi) = vision.ndvi {
        if ndvi >= bands.ndvi_bonus_min {
            delta += bands.ndvi_bonus;
        } else if ndvi < bands.ndvi_penalty_below {
            delta -= bands.ndvi_penalty;
        }
    }
    if vision.pests_detected {
        delta -= bands.pest_penalty;
    }
    if vision.irrigation_failures > 0 {
        delta -= bands.irrigation_failure_penalty;
    }

    delta
}
