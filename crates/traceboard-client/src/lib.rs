//! HTTP query client, snapshot fetching, and export for traceboard
//!
//! This crate talks to the external analytics query service. It provides:
//!
//! - [`HttpAnalyticsService`]: reqwest implementation of
//!   [`AnalyticsService`](traceboard_core::AnalyticsService)
//! - [`AnalyticsQueryClient`]: issues the four snapshot reads concurrently
//!   and assembles an [`AnalyticsSnapshot`](traceboard_core::AnalyticsSnapshot)
//! - [`Exporter`]: server-side export and file naming
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use traceboard_client::{AnalyticsQueryClient, ClientConfig, HttpAnalyticsService};
//! use traceboard_core::FilterState;
//!
//! # async fn example() -> traceboard_core::Result<()> {
//! let config = ClientConfig::default();
//! let service = Arc::new(HttpAnalyticsService::new(&config)?);
//! let client = AnalyticsQueryClient::new(service, config.top_traces);
//!
//! let snapshot = client.fetch_snapshot(&FilterState::default()).await?;
//! println!("{} traces", snapshot.summary.total_traces);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod exporter;
pub mod http;
pub mod query_client;

pub use config::ClientConfig;
pub use exporter::{ExportedFile, Exporter};
pub use http::HttpAnalyticsService;
pub use query_client::AnalyticsQueryClient;
