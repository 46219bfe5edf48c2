//! Query modules for the analytics SDK.
//!
//! Each module provides a query struct that borrows from a [`Connection`](crate::connection::Connection)
//! and loads the dates it touches before running SQL against `daily_metrics`.

pub mod metrics;
pub mod tables;

pub use metrics::MetricsQuery;
pub use tables::TableQuery;
