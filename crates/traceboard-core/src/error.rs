//! Error types for traceboard
//!
//! This module defines the error types used throughout the traceboard crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use traceboard_core::error::{Result, TraceboardError};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert serde_json::Error to TraceboardError
//!     let _value: serde_json::Value = serde_json::from_str("{}")?;
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Remote read operations exposed by the analytics query service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Summary,
    Trends,
    Models,
    TopTraces,
    Export,
    Traces,
    TraceDetail,
    Projects,
}

impl Endpoint {
    /// Path of the endpoint relative to the service base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Summary => "/analytics/summary",
            Self::Trends => "/analytics/trends",
            Self::Models => "/analytics/models",
            Self::TopTraces => "/analytics/top-traces",
            Self::Export => "/analytics/export",
            Self::Traces => "/traces",
            Self::TraceDetail => "/traces/detail",
            Self::Projects => "/projects",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Summary => "summary",
            Self::Trends => "trends",
            Self::Models => "models",
            Self::TopTraces => "top-traces",
            Self::Export => "export",
            Self::Traces => "traces",
            Self::TraceDetail => "trace-detail",
            Self::Projects => "projects",
        };
        f.write_str(name)
    }
}

/// Main error type for traceboard operations
///
/// Covers transport failures, filter validation, snapshot consistency and
/// export failures.
#[derive(Error, Debug)]
pub enum TraceboardError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level failure (connection, timeout, HTTP error status)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Custom range whose start lies after its end
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// One of the snapshot reads failed, so the whole snapshot failed
    #[error("Snapshot failed: {endpoint} read failed: {source}")]
    PartialSnapshotFailure {
        /// The read that failed first
        endpoint: Endpoint,
        /// Why it failed
        source: Box<TraceboardError>,
    },

    /// Export request or save failed
    #[error("Export failed: {0}")]
    ExportFailure(Box<TraceboardError>),

    /// The service returned data that breaks a snapshot invariant
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Trace detail lookup for an unknown trace
    #[error("Trace not found: {0}")]
    TraceNotFound(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Malformed CSV export payload
    #[error("CSV error: {0}")]
    Csv(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The dashboard controller task is no longer running
    #[error("Dashboard controller has shut down")]
    ControllerClosed,
}

/// Coarse classification of an error, cheap to copy into observable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    InvalidRange,
    PartialSnapshot,
    Export,
    InvalidData,
    NotFound,
    Other,
}

impl TraceboardError {
    /// Wrap a read failure so it reports which endpoint broke the snapshot
    pub fn partial(endpoint: Endpoint, source: TraceboardError) -> Self {
        Self::PartialSnapshotFailure {
            endpoint,
            source: Box::new(source),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::PartialSnapshotFailure { .. } => ErrorKind::PartialSnapshot,
            Self::ExportFailure(_) => ErrorKind::Export,
            Self::InvalidSnapshot(_) | Self::Json(_) | Self::Csv(_) => ErrorKind::InvalidData,
            Self::TraceNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }
}

/// Convenience type alias for Results in traceboard
///
/// # Example
///
/// ```
/// use traceboard_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, TraceboardError>;
