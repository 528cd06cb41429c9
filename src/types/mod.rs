//! Shared data structures for the farm monitoring layer
//!
//! - `plot`: plot records, soil/vision readings, `Derived` upstream-vs-computed values
//! - `alert`: alerts, field events, sensors and sensor-health issues
//! - `production`: production snapshots and farm summary from the analytics API
//! - `filters`: the global filter criteria
//! - `decimal`: number-or-string decoding for decimal fields

mod plot;
mod alert;
mod production;
mod filters;
mod decimal;

pub use plot::*;
pub use alert::*;
pub use production::*;
pub use filters::*;
