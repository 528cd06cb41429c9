//! Periodic auto-refresh of the selected farm.
//!
//! A fixed-interval tokio task that asks the cache for a refresh on every
//! tick while a farm is selected. Overlap is prevented by the cache's
//! in-flight guard, not here; missed ticks are skipped instead of bursting.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{FarmDataCache, RefreshOutcome};
use crate::config::RefreshConfig;

/// Counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    /// Ticks with no farm selected
    pub idle_ticks: u64,
    pub refreshed: u64,
    pub failed: u64,
    /// Skipped because a batch was in flight, or discarded as stale
    pub skipped: u64,
}

pub struct RefreshScheduler {
    cache: Arc<FarmDataCache>,
    interval: Duration,
}

impl RefreshScheduler {
    pub const fn new(cache: Arc<FarmDataCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    pub const fn from_config(cache: Arc<FarmDataCache>, config: &RefreshConfig) -> Self {
        Self::new(cache, Duration::from_secs(config.interval_secs))
    }

    /// Spawn the loop onto the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<SchedulerStats> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until `cancel` fires. The first refresh happens one full interval
    /// after start; the initial load belongs to farm selection.
    pub async fn run(self, cancel: CancellationToken) -> SchedulerStats {
        let mut stats = SchedulerStats::default();
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // tokio intervals fire immediately once
        interval.tick().await;

        info!(interval_secs = self.interval.as_secs_f64(), "[RefreshScheduler] started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            stats.ticks += 1;

            if self.cache.farm_id().is_none() {
                stats.idle_ticks += 1;
                continue;
            }

            let outcome = tokio::select! {
                () = cancel.cancelled() => break,
                outcome = self.cache.refresh() => outcome,
            };
            match outcome {
                RefreshOutcome::Updated => stats.refreshed += 1,
                RefreshOutcome::Failed(_) => stats.failed += 1,
                RefreshOutcome::AlreadyInFlight | RefreshOutcome::Stale => {
                    debug!(?outcome, "[RefreshScheduler] tick skipped");
                    stats.skipped += 1;
                }
                RefreshOutcome::NoFarmSelected => stats.idle_ticks += 1,
            }
        }

        info!(
            ticks = stats.ticks,
            refreshed = stats.refreshed,
            failed = stats.failed,
            "[RefreshScheduler] stopped"
        );
        stats
    }
}
