//! Global filtering across plot and production views
//!
//! - `categories`: categorical keys derived from readings (stage, caliber, ...)
//! - `engine`: the conjunctive filter, `FilterRecord` and `FilterSummary`
//! - `presets`: smart filters, active-filter count and saved presets

pub mod categories;
mod engine;
mod presets;

pub use engine::{filter, matches, Facet, FilterRecord, FilterSummary};
pub use presets::{
    count_active_filters, smart_filter, smart_filters, FilterPresets, InMemoryPresetStore,
    JsonFilePresetStore, PresetError, PresetStore, SavedFilterPreset, SmartFilter,
    SmartFilterCategory,
};
