//! Query parameters shared by every analytics read
//!
//! [`QueryParams`] is derived once from a [`FilterState`] and handed to all
//! reads of a snapshot, so the four results always describe the same scope.

use crate::error::{Result, TraceboardError};
use crate::filters::FilterState;
use crate::types::{ProjectId, TimeRange};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of top traces requested
pub const DEFAULT_TOP_TRACES_LIMIT: u32 = 10;

/// Upper bound the service accepts for `limit`
pub const MAX_TOP_TRACES_LIMIT: u32 = 100;

/// Filter-derived parameters of the query contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    pub time_range: TimeRange,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub project_ids: Vec<ProjectId>,
}

impl QueryParams {
    /// Derive the parameters for `filter`
    ///
    /// Bounds are only carried for custom ranges. An empty project selection
    /// yields an empty list, which is encoded as "no restriction".
    ///
    /// # Errors
    ///
    /// Returns [`TraceboardError::InvalidArgument`] for a custom range that
    /// is missing a bound.
    pub fn from_filter(filter: &FilterState) -> Result<Self> {
        let (start_date, end_date) = match filter.time_range() {
            TimeRange::Custom => match (filter.custom_start(), filter.custom_end()) {
                (Some(start), Some(end)) if start > end => {
                    return Err(TraceboardError::InvalidRange { start, end });
                }
                (Some(start), Some(end)) => (Some(start), Some(end)),
                _ => {
                    return Err(TraceboardError::InvalidArgument(
                        "custom time range requires both start and end dates".to_string(),
                    ));
                }
            },
            _ => (None, None),
        };

        Ok(Self {
            time_range: filter.time_range(),
            start_date,
            end_date,
            project_ids: filter.selected_projects().iter().cloned().collect(),
        })
    }

    /// Comma-joined project list, `None` when no project filter applies
    pub fn project_ids_param(&self) -> Option<String> {
        if self.project_ids.is_empty() {
            return None;
        }
        Some(
            self.project_ids
                .iter()
                .map(ProjectId::as_str)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Encode as query-string pairs, omitting absent parameters
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("time_range", self.time_range.as_str().to_string())];
        if let Some(start) = self.start_date {
            pairs.push(("start_date", format_timestamp(&start)));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", format_timestamp(&end)));
        }
        if let Some(ids) = self.project_ids_param() {
            pairs.push(("project_ids", ids));
        }
        pairs
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Metric the service ranks top traces by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopTracesMetric {
    #[default]
    Tokens,
    Cost,
    Duration,
}

impl TopTracesMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Cost => "cost",
            Self::Duration => "duration",
        }
    }
}

impl fmt::Display for TopTracesMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TopTracesMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tokens" => Ok(Self::Tokens),
            "cost" => Ok(Self::Cost),
            "duration" => Ok(Self::Duration),
            _ => Err(format!("Invalid sort metric: {s}")),
        }
    }
}

/// Extra parameters of the top-traces read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopTracesRequest {
    pub limit: u32,
    pub sort_by: TopTracesMetric,
}

impl Default for TopTracesRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_TRACES_LIMIT,
            sort_by: TopTracesMetric::Tokens,
        }
    }
}

impl TopTracesRequest {
    /// Build a request, rejecting limits the service would refuse
    pub fn new(limit: u32, sort_by: TopTracesMetric) -> Result<Self> {
        if !(1..=MAX_TOP_TRACES_LIMIT).contains(&limit) {
            return Err(TraceboardError::InvalidArgument(format!(
                "top traces limit must be between 1 and {MAX_TOP_TRACES_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { limit, sort_by })
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.limit.to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
        ]
    }
}

/// Default page size of a project's trace listing
pub const DEFAULT_TRACE_PAGE_SIZE: u32 = 50;

/// Offset and size of one page of a project's trace listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracePage {
    pub skip: u32,
    pub limit: u32,
}

impl Default for TracePage {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_TRACE_PAGE_SIZE,
        }
    }
}

impl TracePage {
    pub fn new(skip: u32, limit: u32) -> Result<Self> {
        if limit == 0 {
            return Err(TraceboardError::InvalidArgument(
                "trace page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { skip, limit })
    }

    /// The page right after this one
    pub fn next(&self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit),
            limit: self.limit,
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// File format of an analytics export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Download name, `analytics-<date>.<ext>`
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("analytics-{}.{}", date.format("%Y-%m-%d"), self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid export format: {s}")),
        }
    }
}
