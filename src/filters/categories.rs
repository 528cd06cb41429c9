//! Categorical keys derived from raw readings for set-membership filters.

use crate::types::{
    CriticalityLevel, FruitCaliber, IrrigationStatus, PlotStatus, ProductionStage, VisionData,
};

/// Production stage from vision maturity and flowering percentages.
///
/// maturity ≥ 80 → harvest-ready, ≥ 50 → maturation, ≥ 20 → growth;
/// otherwise flowering ≥ 50 → fruit setting, else flowering.
pub fn stage_from_vision(vision: &VisionData) -> Option<ProductionStage> {
    let maturity = vision.maturity_index;
    let flowering = vision.flowering_percentage;
    if maturity.is_none() && flowering.is_none() {
        return None;
    }

    let stage = match maturity {
        Some(m) if m >= 80.0 => ProductionStage::HarvestReady,
        Some(m) if m >= 50.0 => ProductionStage::Maturation,
        Some(m) if m >= 20.0 => ProductionStage::Growth,
        _ if flowering.is_some_and(|f| f >= 50.0) => ProductionStage::FruitSetting,
        _ => ProductionStage::Flowering,
    };
    Some(stage)
}

pub const fn criticality_from_status(status: PlotStatus) -> CriticalityLevel {
    match status {
        PlotStatus::Ok => CriticalityLevel::Normal,
        PlotStatus::Warning => CriticalityLevel::Attention,
        PlotStatus::Critical => CriticalityLevel::Critical,
        PlotStatus::Offline => CriticalityLevel::Emergency,
    }
}

/// Moisture < 15 → under, > 30 → excessive, else optimal.
pub fn irrigation_from_moisture(moisture: f64) -> IrrigationStatus {
    if moisture < 15.0 {
        IrrigationStatus::Under
    } else if moisture > 30.0 {
        IrrigationStatus::Excessive
    } else {
        IrrigationStatus::Optimal
    }
}

/// Caliber from average fruit size (mm): < 60 small, < 80 medium,
/// < 100 large, else extra large.
pub fn caliber_from_size(avg_fruit_size: f64) -> FruitCaliber {
    if avg_fruit_size < 60.0 {
        FruitCaliber::Small
    } else if avg_fruit_size < 80.0 {
        FruitCaliber::Medium
    } else if avg_fruit_size < 100.0 {
        FruitCaliber::Large
    } else {
        FruitCaliber::ExtraLarge
    }
}
