//! Alerts, operational events, sensors and sensor-health issues
//!
//! All of these are read-only from the point of view of this crate: the
//! backend owns the alert lifecycle (created, acknowledged, resolved).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Irrigation,
    Soil,
    Pests,
    Health,
    Production,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub farm_id: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    #[serde(default)]
    pub row_id: Option<String>,
    #[serde(default)]
    pub tree_id: Option<String>,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence_count: u32,
    #[serde(default)]
    pub plot_name: Option<String>,
}

impl Alert {
    pub const fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Irrigation,
    Fertilization,
    Nutrients,
    Pesticide,
    Pruning,
    SoilCorrection,
    Maintenance,
    Harvest,
    #[serde(other)]
    Other,
}

/// Field operation logged against a farm or plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub farm_id: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub title: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub plot_name: Option<String>,
}

// ============================================================================
// Sensors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub farm_id: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    #[serde(default)]
    pub sensor_type_id: Option<String>,
    #[serde(default)]
    pub last_signal_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub battery_level: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub signal_strength: Option<f64>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorIssueKind {
    Offline,
    LowBattery,
    WeakSignal,
}

/// A sensor the backend flagged as unhealthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorHealthIssue {
    pub sensor_id: String,
    pub sensor_name: String,
    #[serde(default)]
    pub plot_id: Option<String>,
    #[serde(default)]
    pub plot_name: Option<String>,
    #[serde(default)]
    pub sensor_type: Option<String>,
    #[serde(default)]
    pub last_signal_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub battery_level: Option<f64>,
    #[serde(default, deserialize_with = "super::decimal::opt_f64_or_text")]
    pub signal_strength: Option<f64>,
    #[serde(default)]
    pub is_online: bool,
    pub issue: SensorIssueKind,
}
