//! farm-pulse - farm monitoring from the command line
//!
//! Exercises the derived-state layer against a live farm backend.
//!
//! # Usage
//!
//! ```bash
//! # Follow one farm, refreshing every 30 s
//! farm-pulse watch --farm <FARM_ID>
//!
//! # One enriched snapshot (table or JSON)
//! farm-pulse snapshot --farm <FARM_ID> --json
//!
//! # One plot with the last 6 hours of readings
//! farm-pulse plot --plot <PLOT_ID> --period 6h
//!
//! # Production analytics for a farm
//! farm-pulse production --farm <FARM_ID>
//! ```
//!
//! # Environment Variables
//!
//! - `FARM_PULSE_CONFIG`: Path to the TOML config file
//! - `FARM_PULSE_API_TOKEN`: Bearer token for the backend
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use farm_pulse::analytics::load_production;
use farm_pulse::cache::{CachePhase, FarmDataCache, FarmSnapshot, RefreshOutcome, RefreshScheduler};
use farm_pulse::detail::{load_plot_detail, TimePeriod};
use farm_pulse::filters::{filter, FilterSummary};
use farm_pulse::{DashboardConfig, FarmDataSource, GlobalFilters, HttpFarmSource};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "farm-pulse")]
#[command(about = "Farm monitoring: plot status, health scores and production analytics")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides FARM_PULSE_CONFIG and ./farm_pulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the backend base URL (e.g. http://localhost:8000/api)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Load a farm and keep it refreshed until Ctrl+C
    Watch {
        #[arg(long)]
        farm: String,
        /// Only show plots whose name or id contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Load a farm once and print its snapshot
    Snapshot {
        #[arg(long)]
        farm: String,
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one plot with its reading history
    Plot {
        #[arg(long)]
        plot: String,
        /// History period: 10m, 30m, 1h, 6h, 24h or 7d
        #[arg(long, default_value = "24h")]
        period: TimePeriod,
        #[arg(long)]
        json: bool,
    },

    /// Production analytics for a farm
    Production {
        #[arg(long)]
        farm: String,
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    if matches!(args.command, SubCommand::Config) {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let source: Arc<dyn FarmDataSource> = Arc::new(
        HttpFarmSource::new(&config.backend).context("Failed to build backend HTTP client")?,
    );
    info!(backend = %config.backend.base_url, "Using farm backend");

    match args.command {
        SubCommand::Watch { farm, search } => run_watch(source, &config, &farm, search).await,
        SubCommand::Snapshot { farm, json } => run_snapshot(source, &config, &farm, json).await,
        SubCommand::Plot { plot, period, json } => {
            let detail = load_plot_detail(
                source.as_ref(),
                &plot,
                period,
                chrono::Utc::now(),
                &config.thresholds,
            )
            .await
            .with_context(|| format!("Failed to load plot {plot}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                let p = &detail.plot;
                println!(
                    "{} ({}): status={} health={:.0} sensors={} readings={} vision={} period={}",
                    p.name(),
                    p.id(),
                    p.status(),
                    p.health_score(),
                    detail.sensors.len(),
                    detail.soil_readings.len(),
                    detail.vision_data.len(),
                    detail.period
                );
            }
            Ok(())
        }
        SubCommand::Production { farm, json } => {
            let view = load_production(source.as_ref(), &farm)
                .await
                .with_context(|| format!("Failed to load production analytics for farm {farm}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let s = &view.stats;
                println!(
                    "{}: plots={} trees={} fruits={} ({:.1}/tree) yield={:.1} t health={:.0} harvest_ready={} in_progress={}",
                    view.summary.farm_name,
                    s.total_plots,
                    s.total_trees,
                    s.total_fruits,
                    s.avg_fruits_per_tree,
                    s.total_estimated_yield_tons,
                    s.avg_health_score,
                    s.harvest_ready,
                    s.in_progress
                );
                for row in &view.rows {
                    println!(
                        "  {:<20} {:<8} stage={:<14} yield={:>9.1} kg harvest_in={}",
                        row.plot_name,
                        row.status.as_str(),
                        row.production_stage.map_or("-", |st| st.as_str()),
                        row.estimated_yield_kg,
                        row.days_to_harvest.map_or_else(|| "-".to_string(), |d| format!("{d}d"))
                    );
                }
            }
            Ok(())
        }
        SubCommand::Config => Ok(()),
    }
}

fn load_config(args: &CliArgs) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DashboardConfig::load(),
    };
    if let Some(url) = &args.backend {
        config.backend.base_url.clone_from(url);
    }
    if config.backend.api_token.is_none() {
        if let Ok(token) = std::env::var(farm_pulse::config::defaults::API_TOKEN_ENV) {
            config.backend.api_token = Some(token).filter(|t| !t.is_empty());
        }
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_snapshot(
    source: Arc<dyn FarmDataSource>,
    config: &DashboardConfig,
    farm: &str,
    json: bool,
) -> Result<()> {
    let cache = FarmDataCache::new(source, config);
    if let RefreshOutcome::Failed(message) = cache.select_farm(Some(farm)).await {
        anyhow::bail!("Failed to load farm {farm}: {message}");
    }
    let snapshot = cache
        .snapshot()
        .with_context(|| format!("No data loaded for farm {farm}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    } else {
        print_snapshot(&snapshot, &GlobalFilters::default());
    }
    Ok(())
}

async fn run_watch(
    source: Arc<dyn FarmDataSource>,
    config: &DashboardConfig,
    farm: &str,
    search: Option<String>,
) -> Result<()> {
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, shutting down...");
        shutdown_token.cancel();
    });

    let filters = GlobalFilters {
        search: search.unwrap_or_default(),
        ..Default::default()
    };

    let cache = Arc::new(FarmDataCache::new(source, config));
    let mut status_rx = cache.subscribe();

    match cache.select_farm(Some(farm)).await {
        RefreshOutcome::Updated => {}
        RefreshOutcome::Failed(message) => warn!(farm, %message, "Initial load failed, will retry"),
        other => warn!(farm, ?other, "Initial load did not complete"),
    }
    if let Some(snapshot) = cache.snapshot() {
        print_snapshot(&snapshot, &filters);
    }
    let _ = status_rx.borrow_and_update();

    let scheduler = RefreshScheduler::from_config(Arc::clone(&cache), &config.refresh)
        .spawn(cancel_token.clone());

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                match status.phase {
                    CachePhase::Ready => {
                        if let Some(snapshot) = cache.snapshot() {
                            print_snapshot(&snapshot, &filters);
                        }
                    }
                    CachePhase::Error => {
                        warn!(error = status.error.as_deref().unwrap_or("unknown"), "Refresh failed, showing last good data");
                    }
                    CachePhase::Idle | CachePhase::Loading | CachePhase::Refreshing => {}
                }
            }
        }
    }

    let stats = scheduler.await.context("Refresh scheduler panicked")?;
    info!(refreshed = stats.refreshed, failed = stats.failed, "Watch stopped");
    Ok(())
}

fn print_snapshot(snapshot: &FarmSnapshot, filters: &GlobalFilters) {
    let s = &snapshot.stats;
    println!(
        "[{}] farm {}: {} plots (ok {}, warning {}, critical {}, offline {}) health {:.0} | moisture {:.1}% temp {:.1}°C pH {:.2} | alerts {} (irrigation {})",
        snapshot.fetched_at.format("%H:%M:%S"),
        snapshot.farm_id,
        s.total_plots,
        s.ok_count,
        s.warning_count,
        s.critical_count,
        s.offline_count,
        s.health_score,
        s.avg_moisture,
        s.avg_temperature,
        s.avg_ph,
        s.active_alerts,
        s.irrigation_issues
    );

    let visible = filter(&snapshot.plots, filters);
    if !filters.is_open() {
        let summary = FilterSummary::compute(&snapshot.plots, filters);
        println!(
            "  showing {}/{} plots, {}/{} trees",
            summary.filtered_plots, summary.total_plots, summary.filtered_trees, summary.total_trees
        );
    }
    for plot in &visible {
        let source = if plot.derived_status.is_authoritative() { "" } else { " (computed)" };
        println!(
            "  {:<24} {:<8}{} health {:>3.0}",
            plot.name(),
            plot.status().as_str(),
            source,
            plot.health_score()
        );
    }
    for issue in &snapshot.sensor_issues {
        println!("  sensor {} ({:?})", issue.sensor_name, issue.issue);
    }
}
