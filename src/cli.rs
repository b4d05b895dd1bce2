//! CLI interface for traceboard
//!
//! Global flags describe the filter and the service connection; the
//! subcommand picks what to show.
//!
//! # Example
//!
//! ```bash
//! # Summary for the last 7 days, two projects
//! traceboard --range last_7d --project p1 --project p2 summary
//!
//! # Custom range, ranked by cost
//! traceboard --range custom --start 2024-05-01 --end 2024-05-10 summary --sort cost
//!
//! # Export as JSON into ./exports
//! traceboard export --format json --output exports
//!
//! # Second page of a project's traces
//! traceboard traces p1 --skip 50
//! ```

use crate::controller::ControllerConfig;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use traceboard_client::ClientConfig;
use traceboard_client::config::DEFAULT_BASE_URL;
use traceboard_core::query::{
    DEFAULT_TOP_TRACES_LIMIT, DEFAULT_TRACE_PAGE_SIZE, ExportFormat, MAX_TOP_TRACES_LIMIT,
    TopTracesMetric, TopTracesRequest,
};
use traceboard_core::{FilterState, ProjectId, Result, TimeRange, TraceboardError};

/// Analytics dashboard for LLM-agent execution traces
#[derive(Parser, Debug, Clone)]
#[command(name = "traceboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Analytics service base URL
    #[arg(long, env = "TRACEBOARD_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "TRACEBOARD_TIMEOUT", default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Time range (last_24h, last_7d, last_30d, all_time, custom)
    #[arg(long, short = 'r', default_value = "all_time", global = true)]
    pub range: TimeRange,

    /// Custom range start (YYYY-MM-DD or RFC 3339)
    #[arg(long, global = true)]
    pub start: Option<String>,

    /// Custom range end (YYYY-MM-DD or RFC 3339); a bare date covers the whole day
    #[arg(long, global = true)]
    pub end: Option<String>,

    /// Restrict to a project ID (repeatable)
    #[arg(long = "project", short = 'p', global = true)]
    pub projects: Vec<String>,

    /// Number of top traces to request
    #[arg(
        long,
        default_value_t = DEFAULT_TOP_TRACES_LIMIT,
        value_parser = clap::value_parser!(u32).range(1..=MAX_TOP_TRACES_LIMIT as i64),
        global = true
    )]
    pub limit: u32,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show summary, trends, cost by model and top traces
    Summary {
        /// Rank top traces by tokens, cost or duration
        #[arg(long, default_value = "tokens")]
        sort: TopTracesMetric,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Show every top trace instead of the first 10
        #[arg(long)]
        all: bool,
    },

    /// Export analytics for the current filter
    Export {
        /// File format (csv or json)
        #[arg(long, short = 'f', default_value = "csv")]
        format: ExportFormat,

        /// Directory to write the file into
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,
    },

    /// Show one trace with its spans
    Trace {
        /// Trace ID
        trace_id: String,
    },

    /// List a project's traces, newest first
    Traces {
        /// Project ID
        project: String,

        /// Number of traces to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Traces per page
        #[arg(long, default_value_t = DEFAULT_TRACE_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: u32,
    },

    /// List projects available as filters
    Projects,

    /// Keep the dashboard open and refresh periodically
    Watch {
        /// Refresh interval in seconds
        #[arg(long, short = 'i', default_value_t = 30)]
        interval: u64,

        /// Debounce delay for filter changes in milliseconds
        #[arg(long, default_value_t = 300)]
        debounce_ms: u64,

        /// Rank top traces by tokens, cost or duration
        #[arg(long, default_value = "tokens")]
        sort: TopTracesMetric,
    },
}

impl Cli {
    /// Build the filter described by the global flags
    pub fn filter(&self) -> Result<FilterState> {
        let projects = self.projects.iter().map(ProjectId::new);
        let filter = FilterState::default()
            .with_time_range(self.range)
            .with_projects(projects);

        if self.range != TimeRange::Custom {
            if self.start.is_some() || self.end.is_some() {
                return Err(TraceboardError::InvalidArgument(
                    "--start/--end require --range custom".to_string(),
                ));
            }
            return Ok(filter);
        }

        let start = self
            .start
            .as_deref()
            .map(|s| parse_date_filter(s, false))
            .transpose()?;
        let end = self
            .end
            .as_deref()
            .map(|s| parse_date_filter(s, true))
            .transpose()?;
        filter.with_custom_range(start, end)
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let sort_by = match &self.command {
            Command::Summary { sort, .. } | Command::Watch { sort, .. } => *sort,
            _ => TopTracesMetric::default(),
        };
        Ok(ClientConfig::default()
            .with_base_url(self.api_url.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_top_traces(TopTracesRequest::new(self.limit, sort_by)?))
    }

    pub fn controller_config(&self) -> ControllerConfig {
        let debounce = match &self.command {
            Command::Watch { debounce_ms, .. } => Duration::from_millis(*debounce_ms),
            _ => crate::controller::DEFAULT_DEBOUNCE,
        };
        ControllerConfig {
            debounce,
            ..ControllerConfig::default()
        }
    }
}

/// Parse a date bound given on the command line
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates. A plain date
/// maps to the start of the day, or to its last millisecond when
/// `end_of_day` is set.
pub fn parse_date_filter(date_str: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
        TraceboardError::InvalidDate(format!(
            "Invalid date format: {date_str}. Expected YYYY-MM-DD or RFC 3339"
        ))
    })?;

    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| TraceboardError::InvalidDate(format!("Invalid date: {date_str}")))
}
