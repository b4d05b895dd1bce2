//! Core domain types for traceboard
//!
//! Strongly-typed identifiers and the small enums shared by filters,
//! analytics results and the wire contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed project identifier
///
/// # Examples
/// ```
/// use traceboard_core::types::ProjectId;
///
/// let project = ProjectId::new("p1");
/// assert_eq!(project.as_str(), "p1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a new ProjectId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strongly-typed trace identifier, the unique key of a trace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Create a new TraceId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Time window selected for analytics queries
///
/// # Examples
/// ```
/// use traceboard_core::types::TimeRange;
/// use std::str::FromStr;
///
/// let range = TimeRange::from_str("last_7d").unwrap();
/// assert_eq!(range, TimeRange::Last7d);
/// assert_eq!(TimeRange::AllTime.to_string(), "all_time");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "last_24h")]
    Last24h,
    #[serde(rename = "last_7d")]
    Last7d,
    #[serde(rename = "last_30d")]
    Last30d,
    #[default]
    #[serde(rename = "all_time")]
    AllTime,
    #[serde(rename = "custom")]
    Custom,
}

impl TimeRange {
    /// All ranges in picker order
    pub const ALL: [TimeRange; 5] = [
        Self::Last24h,
        Self::Last7d,
        Self::Last30d,
        Self::AllTime,
        Self::Custom,
    ];

    /// Wire name used by the query service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last24h => "last_24h",
            Self::Last7d => "last_7d",
            Self::Last30d => "last_30d",
            Self::AllTime => "all_time",
            Self::Custom => "custom",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Last24h => "Last 24 hours",
            Self::Last7d => "Last 7 days",
            Self::Last30d => "Last 30 days",
            Self::AllTime => "All time",
            Self::Custom => "Custom range",
        }
    }

    /// Length of a rolling window, `None` for unbounded or custom ranges
    pub fn rolling_window(&self) -> Option<chrono::Duration> {
        match self {
            Self::Last24h => Some(chrono::Duration::hours(24)),
            Self::Last7d => Some(chrono::Duration::days(7)),
            Self::Last30d => Some(chrono::Duration::days(30)),
            Self::AllTime | Self::Custom => None,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last_24h" | "24h" => Ok(Self::Last24h),
            "last_7d" | "7d" => Ok(Self::Last7d),
            "last_30d" | "30d" => Ok(Self::Last30d),
            "all_time" | "all" => Ok(Self::AllTime),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Invalid time range: {s}")),
        }
    }
}

/// Width of the time buckets used for trend points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hour => write!(f, "hour"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(format!("Invalid granularity: {s}")),
        }
    }
}

/// Execution status of a trace or span
///
/// Unknown statuses reported by the service are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TraceStatus {
    #[default]
    Running,
    Success,
    Failed,
    Other(String),
}

impl TraceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TraceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<TraceStatus> for String {
    fn from(status: TraceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
