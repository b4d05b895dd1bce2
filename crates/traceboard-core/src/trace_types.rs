//! Trace detail and project types
//!
//! These are consumed by navigation (trace drill-down) and the project
//! picker; they sit outside the analytics snapshot.

use crate::analytics_types::lenient_timestamp;
use crate::types::{ProjectId, TraceId, TraceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Kind of step a span records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
    LlmCall,
    ToolCall,
    AgentStep,
    A2aMessage,
    RunnerStep,
    #[serde(other)]
    Other,
}

/// LLM call embedded in a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCall {
    pub model_name: String,
    pub provider: String,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// Tool call embedded in a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub tool_inputs: serde_json::Value,
    #[serde(default)]
    pub tool_outputs: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// One step within a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub span_id: String,
    pub trace_id: TraceId,
    #[serde(default)]
    pub parent_span_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub span_type: SpanType,
    #[serde(default)]
    pub status: TraceStatus,
    #[serde(with = "lenient_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub inputs: serde_json::Value,
    #[serde(default)]
    pub outputs: serde_json::Value,
    #[serde(default, alias = "meta")]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub llm_call: Option<LlmCall>,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
}

impl Span {
    pub fn is_llm_call(&self) -> bool {
        self.span_type == SpanType::LlmCall || self.llm_call.is_some()
    }

    pub fn is_tool_call(&self) -> bool {
        self.span_type == SpanType::ToolCall || self.tool_call.is_some()
    }
}

/// Trace header of a detail response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace_id: TraceId,
    pub name: String,
    #[serde(default)]
    pub status: TraceStatus,
    #[serde(with = "lenient_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, alias = "meta")]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One row of a project's trace listing
///
/// Same header as a detail response plus the service's row ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceListItem {
    pub id: String,
    #[serde(flatten)]
    pub trace: TraceRecord,
}

/// Trace with all of its spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceDetail {
    pub trace: TraceRecord,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Statistics derived from the spans of one trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpanStats {
    pub llm_call_count: usize,
    pub tool_call_count: usize,
    pub failed_spans: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub avg_span_duration_ms: f64,
    pub models: BTreeSet<String>,
    pub tools: BTreeSet<String>,
}

impl TraceDetail {
    /// Aggregate the spans of this trace
    pub fn stats(&self) -> SpanStats {
        let mut stats = SpanStats::default();
        let mut total_duration = 0.0;

        for span in &self.spans {
            if span.is_llm_call() {
                stats.llm_call_count += 1;
            }
            if span.is_tool_call() {
                stats.tool_call_count += 1;
            }
            if span.status == TraceStatus::Failed {
                stats.failed_spans += 1;
            }
            if let Some(call) = &span.llm_call {
                stats.input_tokens += call.input_tokens;
                stats.output_tokens += call.output_tokens;
                stats.models.insert(call.model_name.clone());
            }
            if let Some(call) = &span.tool_call {
                stats.tools.insert(call.tool_name.clone());
            }
            total_duration += span.duration_ms.unwrap_or(0.0);
        }

        if !self.spans.is_empty() {
            stats.avg_span_duration_ms = total_duration / self.spans.len() as f64;
        }
        stats
    }
}

/// Project available for filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| lenient_timestamp::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}
