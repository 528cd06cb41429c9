//! Farm data cache and its auto-refresh task
//!
//! - `polling`: `FarmDataCache`, the single-farm snapshot owner
//! - `scheduler`: `RefreshScheduler`, the cancellable periodic refresher

mod polling;
mod scheduler;

pub use polling::{CachePhase, CacheStatus, FarmDataCache, FarmSnapshot, RefreshOutcome};
pub use scheduler::{RefreshScheduler, SchedulerStats};
