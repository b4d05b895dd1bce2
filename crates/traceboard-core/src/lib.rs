//! Core types, filters, and traits for traceboard
//!
//! This crate provides the foundational types, error handling, the filter
//! value object and its query-parameter encoding, the analytics service
//! trait, and the client-side top-traces sorter used by all other
//! traceboard crates.

pub mod analytics_types;
pub mod error;
pub mod export_format;
pub mod filters;
pub mod query;
pub mod service;
pub mod sorter;
pub mod trace_types;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use analytics_types::AnalyticsSnapshot;
pub use error::{Endpoint, Result, TraceboardError};
pub use filters::FilterState;
pub use query::QueryParams;
pub use service::AnalyticsService;
pub use types::{Granularity, ProjectId, TimeRange, TraceId, TraceStatus};
