//! Per-plot derived values: status classification, health scoring and the
//! "upstream wins, else compute" enrichment that combines them.

mod enrichment;
mod health_scoring;
mod status;

pub use enrichment::{enrich, enrich_all};
pub use health_scoring::{score, score_with};
pub use status::{classify, classify_with};
