//! Farm Pulse: derived-state layer for farm monitoring
//!
//! Turns raw soil/vision readings from a farm backend into plot status,
//! health scores, farm aggregates and filtered views, and keeps one farm's
//! working set fresh through a polling cache.
//!
//! ## Architecture
//!
//! - **Processing**: status classifier, health scorer, upstream-vs-computed enrichment
//! - **Analytics**: farm stats and production roll-ups
//! - **Filters**: global filter engine, smart filters and saved presets
//! - **Backend**: `FarmDataSource` boundary and its HTTP client
//! - **Cache**: polling snapshot owner and the auto-refresh scheduler
//! - **Detail**: per-plot history over a selectable period

pub mod analytics;
pub mod backend;
pub mod cache;
pub mod config;
pub mod detail;
pub mod filters;
pub mod processing;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, DashboardConfig};

// Re-export commonly used types
pub use types::{
    Alert, Derived, GlobalFilters, Plot, PlotRecord, PlotStatus, SoilReading, VisionData,
};

// Re-export the data boundary and cache
pub use backend::{FarmDataSource, HttpFarmSource, SourceError};
pub use cache::{CachePhase, CacheStatus, FarmDataCache, FarmSnapshot, RefreshOutcome, RefreshScheduler};

// Re-export derived-state operations
pub use analytics::{aggregate, FarmStats};
pub use filters::{filter, FilterSummary};
pub use processing::{classify, enrich, score};
