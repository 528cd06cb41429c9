//! HTTP implementation of `FarmDataSource` over the farm REST API.
//!
//! All requests carry the bearer token when one is configured. Non-2xx
//! responses are turned into `SourceError::Status` with the backend's
//! `detail` message when the body has one.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{FarmDataSource, TimeWindow};
use crate::config::BackendConfig;
use crate::types::{
    Alert, Event, FarmSummary, PlotRecord, ProductionSnapshot, Sensor, SensorHealthIssue,
    SoilReading, VisionData,
};

/// Data source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    /// Message suitable for the cache's error field.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Error body
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationItem>),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    msg: String,
}

/// Extract a readable message from an error response body.
///
/// `{"detail": "..."}` yields the string; a validation list yields the `msg`
/// fields joined by ", ". Anything else falls back to the status reason.
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
    };
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(ErrorDetail::Message(m)),
        }) if !m.is_empty() => m,
        Ok(ErrorBody {
            detail: Some(ErrorDetail::Validation(items)),
        }) if !items.is_empty() => items
            .into_iter()
            .map(|i| i.msg)
            .collect::<Vec<_>>()
            .join(", "),
        _ => fallback(),
    }
}

// ============================================================================
// Client
// ============================================================================

/// REST client for the farm backend.
#[derive(Clone)]
pub struct HttpFarmSource {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpFarmSource {
    /// Build a client from backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    /// Base URL for logging
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.get(&url).query(query);
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "backend response");

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn window_query(window: TimeWindow) -> [(&'static str, String); 2] {
    [
        ("start_time", window.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("end_time", window.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
    ]
}

#[async_trait]
impl FarmDataSource for HttpFarmSource {
    async fn list_plots_with_readings(&self, farm_id: &str) -> Result<Vec<PlotRecord>, SourceError> {
        self.get_json(
            "/plots/",
            &[
                ("farm_id", farm_id.to_string()),
                ("include_readings", "true".to_string()),
            ],
        )
        .await
    }

    async fn list_active_alerts(&self, farm_id: &str) -> Result<Vec<Alert>, SourceError> {
        self.get_json(
            "/alerts/",
            &[
                ("farm_id", farm_id.to_string()),
                ("resolved", "false".to_string()),
            ],
        )
        .await
    }

    async fn list_recent_events(&self, farm_id: &str, limit: u32) -> Result<Vec<Event>, SourceError> {
        self.get_json(
            "/events/",
            &[
                ("farm_id", farm_id.to_string()),
                ("limit", limit.to_string()),
                ("sort_by", "timestamp".to_string()),
                ("sort_order", "desc".to_string()),
            ],
        )
        .await
    }

    async fn list_sensor_health_issues(&self, farm_id: &str) -> Result<Vec<SensorHealthIssue>, SourceError> {
        self.get_json("/sensors/health-issues", &[("farm_id", farm_id.to_string())])
            .await
    }

    async fn get_plot(&self, plot_id: &str) -> Result<PlotRecord, SourceError> {
        self.get_json(&format!("/plots/{plot_id}"), &[]).await
    }

    async fn list_soil_readings(
        &self,
        plot_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<SoilReading>, SourceError> {
        self.get_json(&format!("/plots/{plot_id}/soil-readings"), &window_query(window))
            .await
    }

    async fn list_vision_data(
        &self,
        plot_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<VisionData>, SourceError> {
        self.get_json(&format!("/plots/{plot_id}/vision-data"), &window_query(window))
            .await
    }

    async fn list_sensors_for_plot(&self, plot_id: &str) -> Result<Vec<Sensor>, SourceError> {
        self.get_json("/sensors/", &[("plot_id", plot_id.to_string())])
            .await
    }

    async fn list_latest_snapshots(&self, farm_id: &str) -> Result<Vec<ProductionSnapshot>, SourceError> {
        self.get_json("/analytics/latest", &[("farm_id", farm_id.to_string())])
            .await
    }

    async fn get_farm_summary(&self, farm_id: &str) -> Result<FarmSummary, SourceError> {
        self.get_json(&format!("/analytics/farm/{farm_id}/summary"), &[])
            .await
    }

    fn source_name(&self) -> &str {
        "HTTP"
    }
}
