//! Analytics data types for traceboard
//!
//! Pure data structures returned by the analytics reads and combined into an
//! [`AnalyticsSnapshot`]. Field names follow the service's JSON.

use crate::error::{Result, TraceboardError};
use crate::types::{Granularity, TraceId, TraceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Allowed deviation of the summed model cost percentages from 100
pub const COST_PERCENTAGE_TOLERANCE: f64 = 0.5;

/// Aggregate metrics over every trace in scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_traces: u64,
    pub total_llm_calls: u64,
    pub total_tool_calls: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub total_duration_ms: f64,
    #[serde(default)]
    pub unique_projects: u64,
}

impl Summary {
    /// No traces matched the filter
    pub fn is_empty(&self) -> bool {
        self.total_traces == 0
    }
}

/// One time bucket of the trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub cost: f64,
    pub trace_count: u64,
}

/// Trend read response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendsResponse {
    pub data: Vec<TrendPoint>,
    pub granularity: Granularity,
}

/// Cost and usage of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStat {
    pub model_name: String,
    pub provider: String,
    pub total_cost: f64,
    pub cost_percentage: f64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub call_count: u64,
}

/// Model breakdown read response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelStat>,
}

/// Read-only projection of a high-usage trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStat {
    pub trace_id: TraceId,
    pub name: String,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub duration_ms: f64,
    pub llm_call_count: u64,
    #[serde(with = "lenient_timestamp")]
    pub start_time: DateTime<Utc>,
    pub project_name: String,
    pub status: TraceStatus,
}

/// Top traces read response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTracesResponse {
    pub traces: Vec<TraceStat>,
}

/// Summary, trends, model breakdown and top traces for one filter
///
/// Only valid as a whole; it is replaced, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub summary: Summary,
    pub trends: Vec<TrendPoint>,
    pub granularity: Granularity,
    pub model_breakdown: Vec<ModelStat>,
    pub top_traces: Vec<TraceStat>,
}

/// Non-fatal data-shape anomaly found in a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeWarning {
    /// Two trend points share a bucket
    DuplicateTrendBucket(DateTime<Utc>),
    /// Model cost percentages do not add up to 100
    CostPercentageDrift { sum: f64 },
    /// The same trace appears twice in the top list
    DuplicateTrace(TraceId),
}

impl AnalyticsSnapshot {
    /// Assemble a snapshot from the four read results
    pub fn from_parts(
        summary: Summary,
        trends: TrendsResponse,
        models: ModelsResponse,
        top: TopTracesResponse,
    ) -> Self {
        Self {
            summary,
            trends: trends.data,
            granularity: trends.granularity,
            model_breakdown: models.models,
            top_traces: top.traces,
        }
    }

    /// No traces matched the filter (distinct from a failed fetch)
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// Check the snapshot invariants
    ///
    /// # Errors
    ///
    /// Returns [`TraceboardError::InvalidSnapshot`] when trend timestamps go
    /// backwards. Softer violations come back as warnings.
    pub fn check_shape(&self) -> Result<Vec<ShapeWarning>> {
        let mut warnings = Vec::new();

        for pair in self.trends.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.timestamp < prev.timestamp {
                return Err(TraceboardError::InvalidSnapshot(format!(
                    "trend points out of order: {} after {}",
                    next.timestamp, prev.timestamp
                )));
            }
            if next.timestamp == prev.timestamp {
                warnings.push(ShapeWarning::DuplicateTrendBucket(next.timestamp));
            }
        }

        let total_cost: f64 = self.model_breakdown.iter().map(|m| m.total_cost).sum();
        if total_cost > 0.0 {
            let sum: f64 = self
                .model_breakdown
                .iter()
                .map(|m| m.cost_percentage)
                .sum();
            if (sum - 100.0).abs() > COST_PERCENTAGE_TOLERANCE {
                warnings.push(ShapeWarning::CostPercentageDrift { sum });
            }
        }

        let mut seen = HashSet::new();
        for trace in &self.top_traces {
            if !seen.insert(&trace.trace_id) {
                warnings.push(ShapeWarning::DuplicateTrace(trace.trace_id.clone()));
            }
        }

        Ok(warnings)
    }
}

/// Summed trend buckets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub cost: f64,
    pub trace_count: u64,
}

impl TrendTotals {
    pub fn from_trends(points: &[TrendPoint]) -> Self {
        let mut totals = Self::default();
        for point in points {
            totals.input_tokens += point.input_tokens;
            totals.output_tokens += point.output_tokens;
            totals.total_tokens += point.total_tokens;
            totals.cost += point.cost;
            totals.trace_count += point.trace_count;
        }
        totals
    }
}

/// Timestamps as sent by the service
///
/// Accepts RFC 3339 as well as naive ISO datetimes, which are taken as UTC.
pub mod lenient_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&crate::query::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Parse a service timestamp
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }
}
