//! Smart filters, active-filter counting and user-saved presets.
//!
//! Saved presets go through the `PresetStore` port so the manager does not
//! care where they live:
//! - `InMemoryPresetStore`: tests and throwaway sessions
//! - `JsonFilePresetStore`: a JSON file, written atomically (temp + rename)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

use crate::types::{
    CriticalityLevel, FilterOverlay, FruitCaliber, GlobalFilters, HarvestWindow,
    IrrigationStatus, MangoVariety, NumericRange, ProductionStage,
};

// ============================================================================
// Smart filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartFilterCategory {
    Harvest,
    Quality,
    Intervention,
    Monitoring,
}

/// Built-in one-click filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartFilter {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: SmartFilterCategory,
    pub overlay: FilterOverlay,
}

impl SmartFilter {
    /// Overlay this preset on the current filters.
    pub fn apply(&self, current: &GlobalFilters) -> GlobalFilters {
        current.overlaid(&self.overlay)
    }
}

/// The built-in smart filters. Constraints on dimensions this crate does not
/// track (flower/fruit density, recent interventions) are left out, so those
/// presets keep only their stage/criticality parts.
pub fn smart_filters() -> Vec<SmartFilter> {
    vec![
        SmartFilter {
            id: "harvest_14d",
            name: "Colheita em 14 dias",
            description: "Talhões prontos para colheita nos próximos 14 dias",
            category: SmartFilterCategory::Harvest,
            overlay: FilterOverlay {
                harvest_window: Some(HarvestWindow::WithinDays(14)),
                production_stages: Some(vec![
                    ProductionStage::HarvestReady,
                    ProductionStage::Maturation,
                ]),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "critical_high_yield",
            name: "Críticos alto potencial",
            description: "Talhões críticos com alta produtividade esperada",
            category: SmartFilterCategory::Monitoring,
            overlay: FilterOverlay {
                criticality_levels: Some(vec![
                    CriticalityLevel::Critical,
                    CriticalityLevel::Emergency,
                ]),
                yield_range: Some(NumericRange::at_least(5000.0)),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "high_flower_low_fruit",
            name: "Alta floração, baixa frutificação",
            description: "Talhões com muitas flores mas poucos frutos",
            category: SmartFilterCategory::Quality,
            overlay: FilterOverlay {
                production_stages: Some(vec![
                    ProductionStage::FruitSetting,
                    ProductionStage::Growth,
                ]),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "recent_fertilization_no_improvement",
            name: "Fertilização sem melhoria",
            description: "Talhões fertilizados recentemente sem melhora visível",
            category: SmartFilterCategory::Intervention,
            overlay: FilterOverlay {
                criticality_levels: Some(vec![
                    CriticalityLevel::Attention,
                    CriticalityLevel::Critical,
                ]),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "kent_maturation_large",
            name: "Kent maturação calibre grande",
            description: "Variedade Kent em maturação com calibre grande",
            category: SmartFilterCategory::Harvest,
            overlay: FilterOverlay {
                varieties: Some(vec![MangoVariety::Kent]),
                production_stages: Some(vec![ProductionStage::Maturation]),
                calibers: Some(vec![FruitCaliber::Large, FruitCaliber::ExtraLarge]),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "irrigation_issues",
            name: "Problemas de irrigação",
            description: "Talhões com irrigação abaixo ou acima do ideal",
            category: SmartFilterCategory::Monitoring,
            overlay: FilterOverlay {
                irrigation_status: Some(vec![IrrigationStatus::Under, IrrigationStatus::Excessive]),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "needs_attention",
            name: "Requer atenção",
            description: "Todos os talhões que requerem monitoramento",
            category: SmartFilterCategory::Monitoring,
            overlay: FilterOverlay {
                criticality_levels: Some(vec![
                    CriticalityLevel::Attention,
                    CriticalityLevel::Critical,
                    CriticalityLevel::Emergency,
                ]),
                ..Default::default()
            },
        },
        SmartFilter {
            id: "tommy_premium",
            name: "Tommy Atkins Premium",
            description: "Tommy Atkins com características premium",
            category: SmartFilterCategory::Quality,
            overlay: FilterOverlay {
                varieties: Some(vec![MangoVariety::TommyAtkins]),
                calibers: Some(vec![FruitCaliber::Large, FruitCaliber::ExtraLarge]),
                criticality_levels: Some(vec![CriticalityLevel::Normal]),
                ..Default::default()
            },
        },
    ]
}

/// Look up a built-in smart filter by id.
pub fn smart_filter(id: &str) -> Option<SmartFilter> {
    smart_filters().into_iter().find(|f| f.id == id)
}

/// Number of dimensions currently constraining results (filter-bar badge).
pub fn count_active_filters(filters: &GlobalFilters) -> usize {
    let flags = [
        !filters.varieties.is_empty(),
        !filters.production_stages.is_empty(),
        !filters.criticality_levels.is_empty(),
        !filters.plots.is_empty(),
        filters.harvest_window != HarvestWindow::All,
        !filters.calibers.is_empty(),
        !filters.irrigation_status.is_empty(),
        !filters.search.trim().is_empty(),
        filters.yield_range.is_active(),
        filters.moisture_range.is_active(),
        filters.ph_range.is_active(),
        filters.nitrogen_range.is_active(),
        filters.phosphorus_range.is_active(),
        filters.potassium_range.is_active(),
    ];
    flags.iter().filter(|on| **on).count()
}

// ============================================================================
// Saved presets
// ============================================================================

/// User-defined filter preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilterPreset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub filters: GlobalFilters,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_default: bool,
}

/// Preset persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Preset I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Preset serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Preset storage error: {0}")]
    Storage(String),
    #[error("Preset name must not be empty")]
    EmptyName,
}

/// Persistence port for saved presets.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait PresetStore: Send + Sync {
    fn load(&self) -> Result<Vec<SavedFilterPreset>, PresetError>;

    /// Replace the stored set with `presets`.
    fn save(&self, presets: &[SavedFilterPreset]) -> Result<(), PresetError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Non-durable store; data is lost when dropped.
#[derive(Debug, Default)]
pub struct InMemoryPresetStore {
    presets: RwLock<Vec<SavedFilterPreset>>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for InMemoryPresetStore {
    fn load(&self) -> Result<Vec<SavedFilterPreset>, PresetError> {
        self.presets
            .read()
            .map(|p| p.clone())
            .map_err(|e| PresetError::Storage(e.to_string()))
    }

    fn save(&self, presets: &[SavedFilterPreset]) -> Result<(), PresetError> {
        let mut store = self
            .presets
            .write()
            .map_err(|e| PresetError::Storage(e.to_string()))?;
        *store = presets.to_vec();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Presets in a JSON file. A missing file is an empty set.
#[derive(Debug, Clone)]
pub struct JsonFilePresetStore {
    path: PathBuf,
}

impl JsonFilePresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PresetStore for JsonFilePresetStore {
    fn load(&self) -> Result<Vec<SavedFilterPreset>, PresetError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read(&self.path).map_err(|e| PresetError::Io(self.path.clone(), e))?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn save(&self, presets: &[SavedFilterPreset]) -> Result<(), PresetError> {
        let json = serde_json::to_vec_pretty(presets)?;

        // Write to temp file alongside the target
        let tmp_path = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PresetError::Io(parent.to_path_buf(), e))?;
        }
        std::fs::write(&tmp_path, &json).map_err(|e| PresetError::Io(tmp_path.clone(), e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| PresetError::Io(self.path.clone(), e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json-file"
    }
}

// ============================================================================
// Preset manager
// ============================================================================

/// Saved-preset manager backed by a `PresetStore`.
///
/// Every mutation is written through before it returns.
pub struct FilterPresets {
    store: Box<dyn PresetStore>,
    presets: Vec<SavedFilterPreset>,
}

impl FilterPresets {
    /// Load existing presets from `store`.
    pub fn open(store: Box<dyn PresetStore>) -> Result<Self, PresetError> {
        let presets = store.load()?;
        debug!(backend = store.backend_name(), count = presets.len(), "Filter presets loaded");
        Ok(Self { store, presets })
    }

    pub fn list(&self) -> &[SavedFilterPreset] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&SavedFilterPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Save `filters` under `name` and return the new preset.
    pub fn save_current(
        &mut self,
        name: &str,
        description: Option<&str>,
        filters: &GlobalFilters,
        now: DateTime<Utc>,
    ) -> Result<SavedFilterPreset, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }

        let preset = SavedFilterPreset {
            id: self.next_id(now),
            name: name.to_string(),
            description: description.map(str::to_string),
            filters: filters.clone(),
            created_at: now,
            is_default: false,
        };
        let mut next = self.presets.clone();
        next.push(preset.clone());
        self.store.save(&next)?;
        self.presets = next;

        info!(id = %preset.id, name = %preset.name, "Filter preset saved");
        Ok(preset)
    }

    /// Delete a preset by id. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, PresetError> {
        let next: Vec<SavedFilterPreset> =
            self.presets.iter().filter(|p| p.id != id).cloned().collect();
        if next.len() == self.presets.len() {
            return Ok(false);
        }
        self.store.save(&next)?;
        self.presets = next;
        Ok(true)
    }

    /// `preset_<millis>`, suffixed when two saves land in the same millisecond.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let base = format!("preset_{}", now.timestamp_millis());
        let mut id = base.clone();
        let mut n = 1;
        while self.get(&id).is_some() {
            id = format!("{base}_{n}");
            n += 1;
        }
        id
    }
}
