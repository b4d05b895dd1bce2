//! traceboard - Analytics dashboard for LLM-agent execution traces
//!
//! This library provides functionality to:
//! - Hold the dashboard filter and turn it into service query parameters
//! - Debounce filter changes into one concurrent snapshot fetch
//! - Keep the last good snapshot observable while newer fetches run or fail
//! - Rank top traces client-side and render results as tables or JSON
//! - Export analytics and read the exported totals back
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use traceboard::controller::{ControllerConfig, DebouncedController};
//! use traceboard_client::{AnalyticsQueryClient, ClientConfig, HttpAnalyticsService};
//! use traceboard_core::{FilterState, ProjectId};
//!
//! #[tokio::main]
//! async fn main() -> traceboard::Result<()> {
//!     let config = ClientConfig::default();
//!     let service = Arc::new(HttpAnalyticsService::new(&config)?);
//!     let client = AnalyticsQueryClient::new(service, config.top_traces);
//!
//!     let controller = DebouncedController::spawn(
//!         client,
//!         FilterState::default(),
//!         ControllerConfig::default(),
//!     );
//!     controller.toggle_project(ProjectId::new("research")).await?;
//!
//!     let mut results = controller.subscribe();
//!     while results.changed().await.is_ok() {
//!         if let Some(snapshot) = results.borrow().snapshot() {
//!             println!("{} traces", snapshot.summary.total_traces);
//!             break;
//!         }
//!     }
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod controller;
pub mod live_monitor;
pub mod output;
pub mod store;

// Re-export commonly used types
pub use controller::{ControllerConfig, DebouncedController, Phase};
pub use store::{FetchFailure, ResultStore};
pub use traceboard_core::{
    AnalyticsSnapshot, FilterState, ProjectId, Result, TimeRange, TraceboardError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
