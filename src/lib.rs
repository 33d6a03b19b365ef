//! Weather Collector Library
//!
//! Collects weather observations and forecasts for a list of places from the
//! Finnish Meteorological Institute open data WFS service and stores them in
//! ClickHouse.
//!
//! This library provides tools for:
//! - Building stored query requests for the observation and forecast feeds
//! - Decoding feature collections and service exception reports
//! - Normalizing `(time, parameter, value)` members into fixed-schema rows
//! - Loading rows into ClickHouse as one batch insert per row set
//! - Running a collection pass over every configured location

pub mod collector;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod wfs;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use collector::{Collector, RunSummary};
pub use config::{ClickHouseConfig, Config};
pub use error::{CollectorError, Result, Stage};
pub use loader::{BatchSink, ClickHouseSink, DryRunSink, RowBatch, load};
pub use models::{ForecastRow, Member, ObservationRow, RowKind, TimeWindow, WeatherRow};
pub use wfs::{WeatherFeed, WfsClient};
