//! Shared test utilities for unit tests
//!
//! Integration tests (in tests/) cannot reach this module because it's
//! marked with #[cfg(test)]; they have their own helpers in
//! tests/common/mod.rs.

use crate::analytics_types::{AnalyticsSnapshot, ModelStat, Summary, TraceStat, TrendPoint};
use crate::types::{Granularity, TraceId, TraceStatus};
use chrono::{TimeZone, Utc};

/// Trend bucket on 2024-05-`day` holding `tokens` tokens
pub fn trend_point(day: u32, tokens: u64) -> TrendPoint {
    TrendPoint {
        timestamp: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
        input_tokens: tokens / 2,
        output_tokens: tokens - tokens / 2,
        total_tokens: tokens,
        cost: tokens as f64 * 0.001,
        trace_count: 1,
    }
}

/// Top-trace row with the given sort keys
pub fn trace_stat(id: &str, tokens: u64, cost: f64, duration_ms: f64) -> TraceStat {
    TraceStat {
        trace_id: TraceId::new(id),
        name: format!("{id}_run"),
        total_tokens: tokens,
        total_cost: cost,
        duration_ms,
        llm_call_count: 1,
        start_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        project_name: "project-alpha".to_string(),
        status: TraceStatus::Success,
    }
}

/// Consistent snapshot with `traces` top traces and two models (60/40)
pub fn sample_snapshot(traces: usize) -> AnalyticsSnapshot {
    let top_traces: Vec<TraceStat> = (0..traces)
        .map(|i| trace_stat(&format!("t{i}"), 100 * (i as u64 + 1), 0.01, 1000.0))
        .collect();

    AnalyticsSnapshot {
        summary: Summary {
            total_traces: traces as u64,
            total_llm_calls: traces as u64,
            total_tokens: top_traces.iter().map(|t| t.total_tokens).sum(),
            total_cost: 1.0,
            ..Summary::default()
        },
        trends: vec![trend_point(1, 100), trend_point(2, 200)],
        granularity: Granularity::Day,
        model_breakdown: vec![
            ModelStat {
                model_name: "gemini-2.0-flash".to_string(),
                provider: "google".to_string(),
                total_cost: 0.6,
                cost_percentage: 60.0,
                input_tokens: 100,
                output_tokens: 50,
                total_tokens: 150,
                call_count: 3,
            },
            ModelStat {
                model_name: "gpt-4o-mini".to_string(),
                provider: "openai".to_string(),
                total_cost: 0.4,
                cost_percentage: 40.0,
                input_tokens: 80,
                output_tokens: 20,
                total_tokens: 100,
                call_count: 2,
            },
        ],
        top_traces,
    }
}
