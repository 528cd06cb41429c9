//! Filter Engine Tests
//!
//! Filters over enriched plots and production rows built from realistic
//! backend payloads, smart-filter overlays and preset persistence on disk.

mod common;

use chrono::{TimeZone, Utc};

use common::{offline_plot, plot};
use farm_pulse::analytics::PlotProduction;
use farm_pulse::config::ThresholdConfig;
use farm_pulse::filters::{
    count_active_filters, filter, smart_filter, FilterPresets, FilterSummary, JsonFilePresetStore,
    PresetStore,
};
use farm_pulse::processing::enrich_all;
use farm_pulse::types::{
    CriticalityLevel, FruitCaliber, GlobalFilters, HarvestWindow, IrrigationStatus, MangoVariety,
    NumericRange, Plot, PlotRecord, ProductionSnapshot, ProductionStage, VisionData,
};

fn farm_plots() -> Vec<Plot> {
    let mut kent = plot("p1", "farm-a", 22.0);
    kent.variety = Some("Kent".to_string());
    kent.estimated_yield = Some(4200.0);
    kent.current_vision_data = Some(VisionData {
        maturity_index: Some(60.0),
        avg_fruit_size: Some(85.0),
        fruit_count: 12_000,
        ..Default::default()
    });

    let mut dry = plot("p2", "farm-a", 8.0);
    dry.variety = Some("Tommy Atkins".to_string());
    dry.code = Some("T-NORTE-02".to_string());
    dry.estimated_yield = Some(900.0);

    let mut wet = plot("p3", "farm-a", 33.0);
    wet.variety = Some("Palmer".to_string());

    let records: Vec<PlotRecord> = vec![kent, dry, wet, offline_plot("p4", "farm-a")];
    enrich_all(records, &ThresholdConfig::default())
}

fn ids<R: AsRefId>(records: &[R]) -> Vec<&str> {
    records.iter().map(AsRefId::id_str).collect()
}

trait AsRefId {
    fn id_str(&self) -> &str;
}

impl AsRefId for Plot {
    fn id_str(&self) -> &str {
        self.id()
    }
}

impl AsRefId for PlotProduction {
    fn id_str(&self) -> &str {
        &self.plot_id
    }
}

#[test]
fn test_enriched_statuses_drive_criticality_filter() {
    let plots = farm_plots();
    let criteria = GlobalFilters {
        criticality_levels: vec![CriticalityLevel::Critical, CriticalityLevel::Emergency],
        ..Default::default()
    };
    // p2 is below the critical moisture band; p4 has no reading
    assert_eq!(ids(&filter(&plots, &criteria)), vec!["p2", "p4"]);
}

#[test]
fn test_irrigation_smart_filter_finds_dry_and_wet_plots() {
    let plots = farm_plots();
    let criteria = smart_filter("irrigation_issues")
        .unwrap()
        .apply(&GlobalFilters::default());
    assert_eq!(criteria.irrigation_status, vec![IrrigationStatus::Under, IrrigationStatus::Excessive]);
    assert_eq!(ids(&filter(&plots, &criteria)), vec!["p2", "p3"]);
}

#[test]
fn test_conjunction_of_variety_stage_and_caliber() {
    let plots = farm_plots();
    let criteria = smart_filter("kent_maturation_large")
        .unwrap()
        .apply(&GlobalFilters::default());
    assert_eq!(ids(&filter(&plots, &criteria)), vec!["p1"]);

    let no_match = GlobalFilters {
        varieties: vec![MangoVariety::Kent],
        calibers: vec![FruitCaliber::Small],
        ..Default::default()
    };
    assert!(filter(&plots, &no_match).is_empty());
}

#[test]
fn test_search_matches_code_and_ignores_blank_input() {
    let plots = farm_plots();
    let by_code = GlobalFilters {
        search: "norte".to_string(),
        ..Default::default()
    };
    assert_eq!(ids(&filter(&plots, &by_code)), vec!["p2"]);

    let blank = GlobalFilters {
        search: "   ".to_string(),
        ..Default::default()
    };
    assert_eq!(filter(&plots, &blank).len(), 4);
    assert_eq!(count_active_filters(&blank), 0);
}

#[test]
fn test_yield_range_keeps_plots_without_estimate() {
    let plots = farm_plots();
    let criteria = GlobalFilters {
        yield_range: NumericRange::at_least(1000.0),
        ..Default::default()
    };
    // p3 and p4 have no yield estimate and are not excluded by a range
    assert_eq!(ids(&filter(&plots, &criteria)), vec!["p1", "p3", "p4"]);
}

#[test]
fn test_summary_before_and_after() {
    let plots = farm_plots();
    let criteria = GlobalFilters {
        plots: vec!["p1".to_string(), "p2".to_string()],
        ..Default::default()
    };
    let summary = FilterSummary::compute(&plots, &criteria);
    assert_eq!(summary.total_plots, 4);
    assert_eq!(summary.filtered_plots, 2);
    assert_eq!(summary.total_trees, 350);
    assert_eq!(summary.filtered_trees, 200);
}

#[test]
fn test_production_rows_respect_harvest_window() {
    let row = |id: &str, stage: ProductionStage, days: Option<i64>| {
        PlotProduction::from_snapshot(ProductionSnapshot {
            plot_id: id.to_string(),
            production_stage: Some(stage),
            days_to_harvest: days,
            estimated_yield_kg: Some(1500.0),
            ..Default::default()
        })
    };
    let rows = vec![
        row("r1", ProductionStage::HarvestReady, Some(5)),
        row("r2", ProductionStage::Maturation, Some(30)),
        row("r3", ProductionStage::Maturation, None),
    ];

    let criteria = smart_filter("harvest_14d")
        .unwrap()
        .apply(&GlobalFilters::default());
    assert_eq!(ids(&filter(&rows, &criteria)), vec!["r1", "r3"]);

    let window_only = GlobalFilters {
        harvest_window: HarvestWindow::WithinDays(30),
        ..Default::default()
    };
    assert_eq!(filter(&rows, &window_only).len(), 3);
}

#[test]
fn test_harvest_window_all_keeps_every_production_row() {
    let row = |id: &str, days: Option<i64>| {
        PlotProduction::from_snapshot(ProductionSnapshot {
            plot_id: id.to_string(),
            production_stage: Some(ProductionStage::Maturation),
            days_to_harvest: days,
            ..Default::default()
        })
    };
    let rows = vec![
        row("r1", Some(10_000)),
        row("r2", Some(0)),
        row("r3", None),
        row("r4", Some(-5)),
    ];

    let window_all = GlobalFilters {
        harvest_window: HarvestWindow::All,
        ..Default::default()
    };
    assert_eq!(ids(&filter(&rows, &window_all)), vec!["r1", "r2", "r3", "r4"]);

    // Every other dimension inactive as well: empty sets, open ranges, blank search
    let inactive = GlobalFilters {
        harvest_window: HarvestWindow::All,
        search: " \t ".to_string(),
        moisture_range: NumericRange::OPEN,
        yield_range: NumericRange::OPEN,
        ..Default::default()
    };
    assert_eq!(count_active_filters(&inactive), 0);
    assert_eq!(ids(&filter(&rows, &inactive)), vec!["r1", "r2", "r3", "r4"]);
}

#[test]
fn test_presets_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("presets.json");
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let filters = GlobalFilters {
        varieties: vec![MangoVariety::Kent],
        harvest_window: HarvestWindow::WithinDays(14),
        moisture_range: NumericRange::between(15.0, 30.0),
        ..Default::default()
    };

    let saved_id = {
        let mut presets = FilterPresets::open(Box::new(JsonFilePresetStore::new(&path))).unwrap();
        let saved = presets
            .save_current("Kent colheita", Some("Kent em 14 dias"), &filters, now)
            .unwrap();
        assert_eq!(saved.id, format!("preset_{}", now.timestamp_millis()));
        saved.id
    };
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let mut reopened = FilterPresets::open(Box::new(JsonFilePresetStore::new(&path))).unwrap();
    let preset = reopened.get(&saved_id).unwrap();
    assert_eq!(preset.name, "Kent colheita");
    assert_eq!(preset.filters, filters);
    assert_eq!(preset.created_at, now);

    assert!(reopened.delete(&saved_id).unwrap());
    assert!(JsonFilePresetStore::new(&path).load().unwrap().is_empty());
}

#[test]
fn test_corrupt_preset_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(FilterPresets::open(Box::new(JsonFilePresetStore::new(&path))).is_err());
}
