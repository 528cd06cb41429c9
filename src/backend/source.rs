//! Data-fetching boundary for the derived-state layer.
//!
//! Provides a single async trait over everything the cache and the detail /
//! production loaders read from the backend, so tests can substitute an
//! in-process source for the HTTP client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::SourceError;
use crate::types::{
    Alert, Event, FarmSummary, PlotRecord, ProductionSnapshot, Sensor, SensorHealthIssue,
    SoilReading, VisionData,
};

/// Closed time window `[start, end]` for reading history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Trait abstracting where farm data comes from.
///
/// Every call is independent and may fail; callers decide how failures of a
/// batch are combined.
#[async_trait]
pub trait FarmDataSource: Send + Sync + 'static {
    /// Plots of a farm with their latest soil/vision readings attached.
    async fn list_plots_with_readings(&self, farm_id: &str) -> Result<Vec<PlotRecord>, SourceError>;

    /// Unresolved alerts of a farm.
    async fn list_active_alerts(&self, farm_id: &str) -> Result<Vec<Alert>, SourceError>;

    /// Most recent events of a farm, newest first.
    async fn list_recent_events(&self, farm_id: &str, limit: u32) -> Result<Vec<Event>, SourceError>;

    async fn list_sensor_health_issues(&self, farm_id: &str) -> Result<Vec<SensorHealthIssue>, SourceError>;

    async fn get_plot(&self, plot_id: &str) -> Result<PlotRecord, SourceError>;

    async fn list_soil_readings(
        &self,
        plot_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<SoilReading>, SourceError>;

    async fn list_vision_data(
        &self,
        plot_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<VisionData>, SourceError>;

    async fn list_sensors_for_plot(&self, plot_id: &str) -> Result<Vec<Sensor>, SourceError>;

    /// Latest production snapshot per plot of a farm.
    async fn list_latest_snapshots(&self, farm_id: &str) -> Result<Vec<ProductionSnapshot>, SourceError>;

    async fn get_farm_summary(&self, farm_id: &str) -> Result<FarmSummary, SourceError>;

    /// Human-readable name for logging (e.g. "HTTP").
    fn source_name(&self) -> &str;
}
