//! Aggregates over the enriched working set.
//!
//! - `aggregation`: `FarmStats` over plots and alerts (overview cards)
//! - `production`: production rows, `FarmProductionStats` and the loader
//!   for the production view

mod aggregation;
mod production;

pub use aggregation::{aggregate, FarmStats};
pub use production::{load_production, FarmProductionStats, PlotProduction, ProductionView};
