//! Polling data cache for the selected farm.
//!
//! Owns the fetch/refresh lifecycle of one farm's working set (plots,
//! alerts, events, sensor-health issues). Every batch issues the four
//! fetches concurrently and is applied atomically: either the whole
//! snapshot is replaced or nothing changes.
//!
//! ## Phases
//!
//! `Idle` → `Loading` → `Ready` ⇄ `Refreshing` → `Ready` | `Error`
//!
//! `Error` keeps the last good snapshot; the next successful batch returns
//! to `Ready` and clears the error.
//!
//! ## Farm switches
//!
//! Selecting a farm bumps a generation counter and drops the snapshot. A
//! batch started under an older generation is discarded when it resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analytics::{aggregate, FarmStats};
use crate::backend::FarmDataSource;
use crate::config::{DashboardConfig, ThresholdConfig};
use crate::processing::enrich_all;
use crate::types::{Alert, Event, Plot, SensorHealthIssue};

// ============================================================================
// Public types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePhase {
    /// No farm selected
    Idle,
    /// First load for the selected farm, no snapshot yet
    Loading,
    Ready,
    /// Batch in flight on top of an existing snapshot
    Refreshing,
    /// Last batch failed; any previous snapshot is kept
    Error,
}

/// Enriched working set for one farm at one refresh. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub farm_id: String,
    pub plots: Vec<Plot>,
    pub alerts: Vec<Alert>,
    pub events: Vec<Event>,
    pub sensor_issues: Vec<SensorHealthIssue>,
    pub stats: FarmStats,
    pub fetched_at: DateTime<Utc>,
}

/// What presentation consumers observe besides the snapshot itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub farm_id: Option<String>,
    pub generation: u64,
    pub phase: CachePhase,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheStatus {
    pub const fn is_loading(&self) -> bool {
        matches!(self.phase, CachePhase::Loading)
    }

    pub const fn is_refreshing(&self) -> bool {
        matches!(self.phase, CachePhase::Refreshing)
    }
}

/// Result of a load or refresh request. Fetch errors never escape as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot replaced
    Updated,
    /// A fetch failed; the previous snapshot is unchanged
    Failed(String),
    /// The farm changed while the batch was in flight; result discarded
    Stale,
    /// Another batch for this farm is still outstanding
    AlreadyInFlight,
    NoFarmSelected,
}

// ============================================================================
// Internal state
// ============================================================================

#[derive(Debug)]
struct CacheState {
    farm_id: Option<String>,
    generation: u64,
    phase: CachePhase,
    snapshot: Option<Arc<FarmSnapshot>>,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
    /// Ticket of the outstanding batch for the current generation
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl CacheState {
    const fn new() -> Self {
        Self {
            farm_id: None,
            generation: 0,
            phase: CachePhase::Idle,
            snapshot: None,
            error: None,
            last_updated: None,
            in_flight: None,
            next_ticket: 0,
        }
    }

    fn status(&self) -> CacheStatus {
        CacheStatus {
            farm_id: self.farm_id.clone(),
            generation: self.generation,
            phase: self.phase,
            error: self.error.clone(),
            last_updated: self.last_updated,
        }
    }
}

/// Clears the in-flight marker when a batch future completes or is dropped.
struct InFlightGuard<'a> {
    state: &'a Mutex<CacheState>,
    ticket: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.in_flight == Some(self.ticket) {
            state.in_flight = None;
            if matches!(state.phase, CachePhase::Loading | CachePhase::Refreshing) {
                // Abandoned mid-flight (cancelled); fall back to the settled phase
                state.phase = if state.error.is_some() {
                    CachePhase::Error
                } else if state.snapshot.is_some() {
                    CachePhase::Ready
                } else {
                    CachePhase::Loading
                };
            }
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Single-farm polling cache.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct FarmDataCache {
    source: Arc<dyn FarmDataSource>,
    thresholds: ThresholdConfig,
    events_limit: u32,
    state: Mutex<CacheState>,
    status_tx: watch::Sender<CacheStatus>,
}

impl FarmDataCache {
    pub fn new(source: Arc<dyn FarmDataSource>, config: &DashboardConfig) -> Self {
        let state = CacheState::new();
        let (status_tx, _) = watch::channel(state.status());
        Self {
            source,
            thresholds: config.thresholds.clone(),
            events_limit: config.refresh.recent_events_limit,
            state: Mutex::new(state),
            status_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &CacheState) {
        self.status_tx.send_replace(state.status());
    }

    /// Current snapshot, if one has been loaded for the selected farm.
    pub fn snapshot(&self) -> Option<Arc<FarmSnapshot>> {
        self.lock().snapshot.clone()
    }

    pub fn status(&self) -> CacheStatus {
        self.lock().status()
    }

    pub fn farm_id(&self) -> Option<String> {
        self.lock().farm_id.clone()
    }

    /// Receive a new `CacheStatus` on every phase transition.
    pub fn subscribe(&self) -> watch::Receiver<CacheStatus> {
        self.status_tx.subscribe()
    }

    /// Change the selected farm and load it.
    ///
    /// `None` deselects and returns to `Idle`. Selecting the farm that is
    /// already selected behaves like a manual refresh.
    pub async fn select_farm(&self, farm_id: Option<&str>) -> RefreshOutcome {
        self.switch_farm(farm_id);
        if farm_id.is_none() {
            return RefreshOutcome::NoFarmSelected;
        }
        self.refresh().await
    }

    /// Apply a selection change; a no-op when `farm_id` is already selected.
    fn switch_farm(&self, farm_id: Option<&str>) {
        let mut state = self.lock();
        if state.farm_id.as_deref() == farm_id {
            return;
        }

        state.generation += 1;
        state.farm_id = farm_id.map(str::to_string);
        state.snapshot = None;
        state.error = None;
        state.last_updated = None;
        state.in_flight = None;
        state.phase = if farm_id.is_some() {
            CachePhase::Loading
        } else {
            CachePhase::Idle
        };
        info!(
            farm_id = farm_id.unwrap_or("-"),
            generation = state.generation,
            "Farm selection changed"
        );
        self.publish(&state);
    }

    /// Fetch a fresh batch for the selected farm.
    ///
    /// Used by both the timer and manual refresh. Skipped when a batch for
    /// the same farm is still outstanding.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (farm_id, generation, ticket) = {
            let mut state = self.lock();
            let Some(farm_id) = state.farm_id.clone() else {
                return RefreshOutcome::NoFarmSelected;
            };
            if state.in_flight.is_some() {
                debug!(%farm_id, "Refresh skipped: batch already in flight");
                return RefreshOutcome::AlreadyInFlight;
            }
            state.next_ticket += 1;
            let ticket = state.next_ticket;
            state.in_flight = Some(ticket);
            state.phase = if state.snapshot.is_some() {
                CachePhase::Refreshing
            } else {
                CachePhase::Loading
            };
            self.publish(&state);
            (farm_id, state.generation, ticket)
        };
        let _guard = InFlightGuard {
            state: &self.state,
            ticket,
        };

        let source = self.source.as_ref();
        let batch = tokio::try_join!(
            source.list_plots_with_readings(&farm_id),
            source.list_active_alerts(&farm_id),
            source.list_recent_events(&farm_id, self.events_limit),
            source.list_sensor_health_issues(&farm_id),
        );

        // Build outside the lock; discard later if the farm changed
        let built = batch.map(|(records, alerts, events, sensor_issues)| {
            let plots = enrich_all(records, &self.thresholds);
            let stats = aggregate(&plots, &alerts);
            FarmSnapshot {
                farm_id: farm_id.clone(),
                plots,
                alerts,
                events,
                sensor_issues,
                stats,
                fetched_at: Utc::now(),
            }
        });

        let mut state = self.lock();
        if state.generation != generation {
            debug!(%farm_id, generation, current = state.generation, "Discarding stale batch");
            return RefreshOutcome::Stale;
        }
        state.in_flight = None;

        let outcome = match built {
            Ok(snapshot) => {
                info!(
                    %farm_id,
                    plots = snapshot.plots.len(),
                    alerts = snapshot.alerts.len(),
                    "Farm data refreshed"
                );
                state.last_updated = Some(snapshot.fetched_at);
                state.snapshot = Some(Arc::new(snapshot));
                state.error = None;
                state.phase = CachePhase::Ready;
                RefreshOutcome::Updated
            }
            Err(e) => {
                let message = e.user_message();
                warn!(
                    %farm_id,
                    error = %e,
                    source = self.source.source_name(),
                    kept_snapshot = state.snapshot.is_some(),
                    "Farm data refresh failed"
                );
                state.error = Some(message.clone());
                state.phase = CachePhase::Error;
                RefreshOutcome::Failed(message)
            }
        };
        self.publish(&state);
        outcome
    }
}
