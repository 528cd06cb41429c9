//! Shared fixtures for the integration tests: an in-process `FarmDataSource`
//! whose responses, failures and timing are controlled by the test.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use farm_pulse::backend::TimeWindow;
use farm_pulse::types::{
    Alert, AlertCategory, AlertSeverity, Event, FarmSummary, PlotRecord, ProductionSnapshot,
    Sensor, SensorHealthIssue, SoilReading, VisionData,
};
use farm_pulse::{FarmDataSource, SourceError};

#[derive(Default)]
pub struct MockSource {
    plots: Mutex<HashMap<String, Vec<PlotRecord>>>,
    alerts: Mutex<HashMap<String, Vec<Alert>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    soil: Mutex<Vec<SoilReading>>,
    vision: Mutex<Vec<VisionData>>,
    sensors: Mutex<Vec<Sensor>>,
    snapshots: Mutex<Vec<ProductionSnapshot>>,
    summary: Mutex<FarmSummary>,
    fail_alerts: AtomicBool,
    plot_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_plots(&self, farm_id: &str, plots: Vec<PlotRecord>) {
        self.plots.lock().unwrap().insert(farm_id.to_string(), plots);
    }

    pub fn set_alerts(&self, farm_id: &str, alerts: Vec<Alert>) {
        self.alerts.lock().unwrap().insert(farm_id.to_string(), alerts);
    }

    pub fn set_history(&self, soil: Vec<SoilReading>, vision: Vec<VisionData>, sensors: Vec<Sensor>) {
        *self.soil.lock().unwrap() = soil;
        *self.vision.lock().unwrap() = vision;
        *self.sensors.lock().unwrap() = sensors;
    }

    pub fn set_production(&self, snapshots: Vec<ProductionSnapshot>, summary: FarmSummary) {
        *self.snapshots.lock().unwrap() = snapshots;
        *self.summary.lock().unwrap() = summary;
    }

    /// Make the alert fetch fail until cleared.
    pub fn fail_alerts(&self, fail: bool) {
        self.fail_alerts.store(fail, Ordering::SeqCst);
    }

    /// Hold plot fetches for `farm_id` until the returned `Notify` is signalled.
    pub fn gate(&self, farm_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(farm_id.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn plot_calls(&self) -> usize {
        self.plot_calls.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` plot fetches have started.
    pub async fn wait_for_plot_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.plot_calls() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("plot fetch never started");
    }
}

#[async_trait]
impl FarmDataSource for MockSource {
    async fn list_plots_with_readings(&self, farm_id: &str) -> Result<Vec<PlotRecord>, SourceError> {
        self.plot_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(farm_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.plots.lock().unwrap().get(farm_id).cloned().unwrap_or_default())
    }

    async fn list_active_alerts(&self, farm_id: &str) -> Result<Vec<Alert>, SourceError> {
        if self.fail_alerts.load(Ordering::SeqCst) {
            return Err(SourceError::Status {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(self.alerts.lock().unwrap().get(farm_id).cloned().unwrap_or_default())
    }

    async fn list_recent_events(&self, _farm_id: &str, _limit: u32) -> Result<Vec<Event>, SourceError> {
        Ok(Vec::new())
    }

    async fn list_sensor_health_issues(&self, _farm_id: &str) -> Result<Vec<SensorHealthIssue>, SourceError> {
        Ok(Vec::new())
    }

    async fn get_plot(&self, plot_id: &str) -> Result<PlotRecord, SourceError> {
        self.plots
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|p| p.id == plot_id)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                status: 404,
                message: "Plot not found".to_string(),
            })
    }

    async fn list_soil_readings(&self, _plot_id: &str, window: TimeWindow) -> Result<Vec<SoilReading>, SourceError> {
        Ok(self
            .soil
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.time.is_some_and(|t| window.contains(t)))
            .cloned()
            .collect())
    }

    async fn list_vision_data(&self, _plot_id: &str, window: TimeWindow) -> Result<Vec<VisionData>, SourceError> {
        Ok(self
            .vision
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.time.is_some_and(|t| window.contains(t)))
            .cloned()
            .collect())
    }

    async fn list_sensors_for_plot(&self, _plot_id: &str) -> Result<Vec<Sensor>, SourceError> {
        Ok(self.sensors.lock().unwrap().clone())
    }

    async fn list_latest_snapshots(&self, _farm_id: &str) -> Result<Vec<ProductionSnapshot>, SourceError> {
        Ok(self.snapshots.lock().unwrap().clone())
    }

    async fn get_farm_summary(&self, _farm_id: &str) -> Result<FarmSummary, SourceError> {
        Ok(self.summary.lock().unwrap().clone())
    }

    fn source_name(&self) -> &str {
        "Mock"
    }
}

// ============================================================================
// Record builders
// ============================================================================

pub fn plot(id: &str, farm_id: &str, moisture: f64) -> PlotRecord {
    PlotRecord {
        id: id.to_string(),
        farm_id: farm_id.to_string(),
        name: format!("Talhao {id}"),
        tree_count: 100,
        is_active: true,
        current_soil_reading: Some(SoilReading {
            moisture: Some(moisture),
            temperature: Some(25.0),
            ph: Some(6.5),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn offline_plot(id: &str, farm_id: &str) -> PlotRecord {
    PlotRecord {
        id: id.to_string(),
        farm_id: farm_id.to_string(),
        name: format!("Talhao {id}"),
        tree_count: 50,
        is_active: true,
        ..Default::default()
    }
}

pub fn alert(id: &str, category: AlertCategory, resolved: bool) -> Alert {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    Alert {
        id: id.to_string(),
        farm_id: Some("farm-a".to_string()),
        plot_id: None,
        row_id: None,
        tree_id: None,
        category,
        severity: AlertSeverity::Warning,
        title: String::new(),
        message: String::new(),
        timestamp: ts,
        acknowledged_at: None,
        resolved_at: resolved.then_some(ts),
        recurrence_count: 0,
        plot_name: None,
    }
}
