//! Backend data boundary
//!
//! - `source`: the `FarmDataSource` trait every loader reads through
//! - `client`: `HttpFarmSource`, the reqwest implementation over the REST API

mod client;
mod source;

pub use client::{HttpFarmSource, SourceError};
pub use source::{FarmDataSource, TimeWindow};
