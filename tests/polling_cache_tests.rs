//! Polling Cache Integration Tests
//!
//! Drives `FarmDataCache` and `RefreshScheduler` against an in-process
//! source: farm switches racing in-flight batches, failures that keep the
//! last good snapshot, overlap suppression and cancellable auto-refresh.

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use common::{alert, offline_plot, plot, MockSource};
use farm_pulse::types::AlertCategory;
use farm_pulse::{CachePhase, DashboardConfig, FarmDataCache, PlotStatus, RefreshOutcome, RefreshScheduler};

fn cache_for(source: &Arc<MockSource>) -> Arc<FarmDataCache> {
    Arc::new(FarmDataCache::new(
        Arc::clone(source) as Arc<dyn farm_pulse::FarmDataSource>,
        &DashboardConfig::default(),
    ))
}

// ============================================================================
// Selection and loading
// ============================================================================

#[tokio::test]
async fn test_select_farm_builds_enriched_snapshot() {
    let source = MockSource::new();
    source.set_plots(
        "farm-a",
        vec![plot("p1", "farm-a", 22.0), plot("p2", "farm-a", 12.0), offline_plot("p3", "farm-a")],
    );
    source.set_alerts(
        "farm-a",
        vec![
            alert("a1", AlertCategory::Irrigation, false),
            alert("a2", AlertCategory::Soil, false),
            alert("a3", AlertCategory::Irrigation, true),
        ],
    );
    let cache = cache_for(&source);
    assert_eq!(cache.status().phase, CachePhase::Idle);

    let outcome = cache.select_farm(Some("farm-a")).await;
    assert_eq!(outcome, RefreshOutcome::Updated);

    let snapshot = cache.snapshot().expect("snapshot after load");
    assert_eq!(snapshot.farm_id, "farm-a");
    assert_eq!(snapshot.plots.len(), 3);
    assert_eq!(snapshot.plots[0].status(), PlotStatus::Ok);
    assert_eq!(snapshot.plots[1].status(), PlotStatus::Warning);
    assert_eq!(snapshot.plots[2].status(), PlotStatus::Offline);
    assert!(!snapshot.plots[0].derived_status.is_authoritative());

    let stats = &snapshot.stats;
    assert_eq!(stats.total_plots, 3);
    assert_eq!(stats.offline_count, 1);
    assert_eq!(stats.total_trees, 250);
    assert!((stats.avg_moisture - 17.0).abs() < 1e-9, "offline plot must not count");
    assert_eq!(stats.active_alerts, 2);
    assert_eq!(stats.irrigation_issues, 1);

    let status = cache.status();
    assert_eq!(status.phase, CachePhase::Ready);
    assert_eq!(status.farm_id.as_deref(), Some("farm-a"));
    assert!(status.last_updated.is_some());
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_refresh_without_farm_is_noop() {
    let source = MockSource::new();
    let cache = cache_for(&source);

    assert_eq!(cache.refresh().await, RefreshOutcome::NoFarmSelected);
    assert_eq!(cache.select_farm(None).await, RefreshOutcome::NoFarmSelected);
    assert_eq!(source.plot_calls(), 0);
    assert!(cache.snapshot().is_none());
}

#[tokio::test]
async fn test_deselect_clears_snapshot() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);

    cache.select_farm(Some("farm-a")).await;
    assert!(cache.snapshot().is_some());

    cache.select_farm(None).await;
    assert!(cache.snapshot().is_none());
    assert_eq!(cache.status().phase, CachePhase::Idle);
    assert!(cache.farm_id().is_none());
}

// ============================================================================
// Farm switch while a batch is in flight
// ============================================================================

#[tokio::test]
async fn test_farm_switch_discards_stale_batch() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("a1", "farm-a", 22.0)]);
    source.set_plots("farm-b", vec![plot("b1", "farm-b", 22.0), plot("b2", "farm-b", 22.0)]);
    let gate_a = source.gate("farm-a");
    let cache = cache_for(&source);

    let slow = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.select_farm(Some("farm-a")).await }
    });
    source.wait_for_plot_calls(1).await;
    assert_eq!(cache.status().phase, CachePhase::Loading);

    // Switch before farm A resolves
    let outcome = cache.select_farm(Some("farm-b")).await;
    assert_eq!(outcome, RefreshOutcome::Updated);

    gate_a.notify_one();
    let stale = slow.await.unwrap();
    assert_eq!(stale, RefreshOutcome::Stale);

    let snapshot = cache.snapshot().unwrap();
    assert_eq!(snapshot.farm_id, "farm-b");
    assert_eq!(snapshot.plots.len(), 2);
    assert_eq!(cache.status().phase, CachePhase::Ready);
}

#[tokio::test]
async fn test_overlapping_refresh_is_skipped() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);
    cache.select_farm(Some("farm-a")).await;
    assert_eq!(source.plot_calls(), 1);

    let gate = source.gate("farm-a");
    let pending = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.refresh().await }
    });
    source.wait_for_plot_calls(2).await;
    assert!(cache.status().is_refreshing());
    // Existing snapshot stays visible during a refresh
    assert!(cache.snapshot().is_some());

    assert_eq!(cache.refresh().await, RefreshOutcome::AlreadyInFlight);
    assert_eq!(source.plot_calls(), 2, "second refresh must not fetch");

    gate.notify_one();
    assert_eq!(pending.await.unwrap(), RefreshOutcome::Updated);

    // Marker cleared: a new refresh goes through
    gate.notify_one();
    assert_eq!(cache.refresh().await, RefreshOutcome::Updated);
    assert_eq!(source.plot_calls(), 3);
}

#[tokio::test]
async fn test_cancelled_batch_releases_in_flight_marker() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);
    cache.select_farm(Some("farm-a")).await;

    let _gate = source.gate("farm-a");
    let abandoned = tokio::time::timeout(Duration::from_millis(50), cache.refresh()).await;
    assert!(abandoned.is_err(), "gated refresh should time out");

    assert_eq!(cache.status().phase, CachePhase::Ready);
    let next = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.refresh().await }
    });
    source.wait_for_plot_calls(3).await;
    next.abort();
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_failed_refresh_keeps_last_snapshot_then_recovers() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);
    cache.select_farm(Some("farm-a")).await;
    let before = cache.snapshot().unwrap();

    source.fail_alerts(true);
    let outcome = cache.refresh().await;
    match outcome {
        RefreshOutcome::Failed(message) => assert_eq!(message, "Service Unavailable"),
        other => panic!("expected failure, got {other:?}"),
    }
    let status = cache.status();
    assert_eq!(status.phase, CachePhase::Error);
    assert_eq!(status.error.as_deref(), Some("Service Unavailable"));
    let kept = cache.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &kept), "snapshot must be untouched");

    source.fail_alerts(false);
    assert_eq!(cache.refresh().await, RefreshOutcome::Updated);
    let status = cache.status();
    assert_eq!(status.phase, CachePhase::Ready);
    assert!(status.error.is_none());
    assert!(!Arc::ptr_eq(&before, &cache.snapshot().unwrap()));
}

#[tokio::test]
async fn test_first_load_failure_has_no_snapshot() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    source.fail_alerts(true);
    let cache = cache_for(&source);

    let outcome = cache.select_farm(Some("farm-a")).await;
    assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    assert!(cache.snapshot().is_none());
    assert_eq!(cache.status().phase, CachePhase::Error);
}

#[tokio::test]
async fn test_subscribers_see_phase_transitions() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);
    let mut rx = cache.subscribe();
    assert_eq!(rx.borrow().phase, CachePhase::Idle);

    cache.select_farm(Some("farm-a")).await;
    assert!(rx.has_changed().unwrap());
    let status = rx.borrow_and_update().clone();
    assert_eq!(status.phase, CachePhase::Ready);
    assert_eq!(status.generation, 1);
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test]
async fn test_scheduler_idle_without_farm() {
    let source = MockSource::new();
    let cache = cache_for(&source);
    let cancel = CancellationToken::new();

    let handle = RefreshScheduler::new(Arc::clone(&cache), Duration::from_millis(10)).spawn(cancel.clone());
    tokio::time::sleep(Duration::from_millis(80)).await;
    cancel.cancel();
    let stats = handle.await.unwrap();

    assert!(stats.idle_ticks > 0);
    assert_eq!(stats.refreshed, 0);
    assert_eq!(source.plot_calls(), 0);
}

#[tokio::test]
async fn test_scheduler_refreshes_selected_farm() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);
    cache.select_farm(Some("farm-a")).await;
    let first = cache.snapshot().unwrap().fetched_at;

    let cancel = CancellationToken::new();
    let handle = RefreshScheduler::new(Arc::clone(&cache), Duration::from_millis(10)).spawn(cancel.clone());
    tokio::time::sleep(Duration::from_millis(80)).await;
    cancel.cancel();
    let stats = handle.await.unwrap();

    assert!(stats.refreshed >= 1, "stats: {stats:?}");
    assert!(source.plot_calls() >= 2);
    assert!(cache.snapshot().unwrap().fetched_at >= first);
}

#[tokio::test]
async fn test_scheduler_stops_on_cancel_mid_refresh() {
    let source = MockSource::new();
    source.set_plots("farm-a", vec![plot("p1", "farm-a", 22.0)]);
    let cache = cache_for(&source);
    cache.select_farm(Some("farm-a")).await;
    let _gate = source.gate("farm-a");

    let cancel = CancellationToken::new();
    let handle = RefreshScheduler::new(Arc::clone(&cache), Duration::from_millis(10)).spawn(cancel.clone());
    source.wait_for_plot_calls(2).await;
    cancel.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert_eq!(stats.refreshed, 0);
    // The abandoned batch must not leave the cache stuck
    assert_eq!(cache.status().phase, CachePhase::Ready);
}
