//! Output formatting for traceboard
//!
//! This module renders analytics data in two formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```no_run
//! use traceboard::output::get_formatter;
//! use traceboard_core::sorter::TopTracesView;
//! # fn show(snapshot: &traceboard_core::AnalyticsSnapshot) {
//! let view = TopTracesView::new(snapshot.top_traces.clone());
//!
//! let formatter = get_formatter(false);
//! println!("{}", formatter.format_snapshot(snapshot, &view));
//! # }
//! ```

use chrono::{DateTime, Utc};
use prettytable::{Table, format, row};
use serde_json::json;
use std::path::Path;
use traceboard_core::analytics_types::{TraceStat, TrendTotals};
use traceboard_core::export_format::ExportContents;
use traceboard_core::sorter::TopTracesView;
use traceboard_core::trace_types::{Project, TraceDetail, TraceListItem};
use traceboard_core::{AnalyticsSnapshot, FilterState};

/// Trait for output formatters
pub trait OutputFormatter {
    /// Summary, trends, model breakdown and the top-traces table
    fn format_snapshot(&self, snapshot: &AnalyticsSnapshot, view: &TopTracesView) -> String;

    /// One trace and its spans
    fn format_trace_detail(&self, detail: &TraceDetail) -> String;

    /// One page of a project's traces
    fn format_traces(&self, traces: &[TraceListItem]) -> String;

    /// Projects available as filters
    fn format_projects(&self, projects: &[Project]) -> String;

    /// Result of an export, with the totals read back from the file
    fn format_export(&self, path: &Path, contents: &ExportContents) -> String;

    /// Active filter line for headers
    fn format_filter(&self, filter: &FilterState) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Costs are small per call, so keep four decimals
    fn format_currency(amount: f64) -> String {
        format!("${amount:.4}")
    }

    fn format_duration(ms: f64) -> String {
        if ms >= 1000.0 {
            format!("{:.2}s", ms / 1000.0)
        } else {
            format!("{ms:.0}ms")
        }
    }

    fn traces_table(traces: &[TraceStat]) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Trace",
            b -> "Name",
            b -> "Project",
            b -> "Tokens",
            b -> "Cost",
            b -> "Duration",
            b -> "LLM Calls",
            b -> "Status",
            b -> "Started"
        ]);

        for trace in traces {
            table.add_row(row![
                trace.trace_id,
                trace.name,
                trace.project_name,
                r -> Self::format_number(trace.total_tokens),
                r -> Self::format_currency(trace.total_cost),
                r -> Self::format_duration(trace.duration_ms),
                r -> trace.llm_call_count,
                trace.status,
                trace.start_time.format("%Y-%m-%d %H:%M")
            ]);
        }
        table
    }

    /// Filter line with the concrete window the filter covers at `now`
    fn filter_line(filter: &FilterState, now: DateTime<Utc>) -> String {
        let mut line = format!("Range: {}", filter.time_range().label());
        match filter.resolved_bounds(now) {
            (Some(start), Some(end)) => line.push_str(&format!(
                " ({} to {})",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            )),
            (Some(start), None) => {
                line.push_str(&format!(" (from {})", start.format("%Y-%m-%d %H:%M")))
            }
            (None, Some(end)) => {
                line.push_str(&format!(" (until {})", end.format("%Y-%m-%d %H:%M")))
            }
            (None, None) => {}
        }
        if !filter.selected_projects().is_empty() {
            let projects: Vec<&str> = filter
                .selected_projects()
                .iter()
                .map(|p| p.as_str())
                .collect();
            line.push_str(&format!("  Projects: {}", projects.join(", ")));
        }
        line
    }
}

impl OutputFormatter for TableFormatter {
    fn format_snapshot(&self, snapshot: &AnalyticsSnapshot, view: &TopTracesView) -> String {
        if snapshot.is_empty() {
            return "No traces match the current filters.\n".to_string();
        }

        let mut output = String::new();
        let s = &snapshot.summary;

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Metric", b -> "Value"]);
        table.add_row(row!["Traces", r -> Self::format_number(s.total_traces)]);
        table.add_row(row!["LLM calls", r -> Self::format_number(s.total_llm_calls)]);
        table.add_row(row!["Tool calls", r -> Self::format_number(s.total_tool_calls)]);
        table.add_row(row!["Input tokens", r -> Self::format_number(s.total_input_tokens)]);
        table.add_row(row!["Output tokens", r -> Self::format_number(s.total_output_tokens)]);
        table.add_row(row!["Total tokens", r -> Self::format_number(s.total_tokens)]);
        table.add_row(row!["Total cost", r -> Self::format_currency(s.total_cost)]);
        table.add_row(row!["Avg duration", r -> Self::format_duration(s.avg_duration_ms)]);
        table.add_row(row!["Projects", r -> Self::format_number(s.unique_projects)]);
        output.push_str("\n=== Summary ===\n");
        output.push_str(&table.to_string());

        if !snapshot.trends.is_empty() {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
            table.set_titles(row![
                b -> "Bucket",
                b -> "Input",
                b -> "Output",
                b -> "Total",
                b -> "Cost",
                b -> "Traces"
            ]);
            let bucket_format = match snapshot.granularity {
                traceboard_core::Granularity::Hour => "%Y-%m-%d %H:00",
                _ => "%Y-%m-%d",
            };
            for point in &snapshot.trends {
                table.add_row(row![
                    point.timestamp.format(bucket_format),
                    r -> Self::format_number(point.input_tokens),
                    r -> Self::format_number(point.output_tokens),
                    r -> Self::format_number(point.total_tokens),
                    r -> Self::format_currency(point.cost),
                    r -> point.trace_count
                ]);
            }
            let totals = TrendTotals::from_trends(&snapshot.trends);
            table.add_row(row![
                b -> "TOTAL",
                r -> Self::format_number(totals.input_tokens),
                r -> Self::format_number(totals.output_tokens),
                r -> Self::format_number(totals.total_tokens),
                r -> Self::format_currency(totals.cost),
                r -> totals.trace_count
            ]);
            output.push_str(&format!("\n=== Trends (per {}) ===\n", snapshot.granularity));
            output.push_str(&table.to_string());
        }

        if !snapshot.model_breakdown.is_empty() {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
            table.set_titles(row![
                b -> "Model",
                b -> "Provider",
                b -> "Cost",
                b -> "Share",
                b -> "Tokens",
                b -> "Calls"
            ]);
            for model in &snapshot.model_breakdown {
                table.add_row(row![
                    model.model_name,
                    model.provider,
                    r -> Self::format_currency(model.total_cost),
                    r -> format!("{:.1}%", model.cost_percentage),
                    r -> Self::format_number(model.total_tokens),
                    r -> model.call_count
                ]);
            }
            output.push_str("\n=== Cost by model ===\n");
            output.push_str(&table.to_string());
        }

        if !view.is_empty() {
            output.push_str(&format!(
                "\n=== Top traces (by {}, {:?}) ===\n",
                view.field(),
                view.direction()
            ));
            output.push_str(&Self::traces_table(&view.visible()).to_string());
            if view.can_expand() && !view.is_expanded() {
                output.push_str(&format!(
                    "... {} more, use --all to show every trace\n",
                    view.len() - view.visible().len()
                ));
            }
        }

        output
    }

    fn format_trace_detail(&self, detail: &TraceDetail) -> String {
        let trace = &detail.trace;
        let stats = detail.stats();
        let mut output = format!(
            "Trace {} ({})\nStatus: {}  Started: {}  Duration: {}\nTokens: {}  Cost: {}\n",
            trace.trace_id,
            trace.name,
            trace.status,
            trace.start_time.format("%Y-%m-%d %H:%M:%S"),
            trace
                .duration_ms
                .map(Self::format_duration)
                .unwrap_or_else(|| "-".to_string()),
            Self::format_number(trace.total_tokens),
            Self::format_currency(trace.total_cost),
        );
        output.push_str(&format!(
            "LLM calls: {}  Tool calls: {}  Failed spans: {}\n",
            stats.llm_call_count, stats.tool_call_count, stats.failed_spans
        ));

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Span",
            b -> "Name",
            b -> "Type",
            b -> "Status",
            b -> "Duration",
            b -> "Detail"
        ]);
        for span in &detail.spans {
            let detail = if let Some(call) = &span.llm_call {
                format!("{} ({} tokens)", call.model_name, call.total_tokens)
            } else if let Some(call) = &span.tool_call {
                call.tool_name.clone()
            } else {
                span.error.clone().unwrap_or_default()
            };
            table.add_row(row![
                span.span_id,
                span.name,
                format!("{:?}", span.span_type),
                span.status,
                r -> span.duration_ms.map(Self::format_duration).unwrap_or_else(|| "-".to_string()),
                detail
            ]);
        }
        output.push_str(&table.to_string());
        output
    }

    fn format_traces(&self, traces: &[TraceListItem]) -> String {
        if traces.is_empty() {
            return "No traces on this page.\n".to_string();
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Trace",
            b -> "Name",
            b -> "Status",
            b -> "Tokens",
            b -> "Cost",
            b -> "Duration",
            b -> "Started",
            b -> "Tags"
        ]);
        for item in traces {
            let trace = &item.trace;
            table.add_row(row![
                trace.trace_id,
                trace.name,
                trace.status,
                r -> Self::format_number(trace.total_tokens),
                r -> Self::format_currency(trace.total_cost),
                r -> trace.duration_ms.map(Self::format_duration).unwrap_or_else(|| "-".to_string()),
                trace.start_time.format("%Y-%m-%d %H:%M"),
                trace.tags.join(", ")
            ]);
        }
        table.to_string()
    }

    fn format_projects(&self, projects: &[Project]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "ID", b -> "Name", b -> "Active", b -> "Description"]);
        for project in projects {
            table.add_row(row![
                project.id,
                project.name,
                if project.is_active { "yes" } else { "no" },
                project.description.as_deref().unwrap_or("")
            ]);
        }
        table.to_string()
    }

    fn format_export(&self, path: &Path, contents: &ExportContents) -> String {
        format!(
            "Exported to {}\n  Traces: {}  Tokens: {}  Cost: {}\n  Model rows: {}  Trace rows: {}\n",
            path.display(),
            Self::format_number(contents.summary.total_traces),
            Self::format_number(contents.summary.total_tokens),
            Self::format_currency(contents.summary.total_cost),
            contents.model_rows,
            contents.trace_rows,
        )
    }

    fn format_filter(&self, filter: &FilterState) -> String {
        Self::filter_line(filter, Utc::now())
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_snapshot(&self, snapshot: &AnalyticsSnapshot, view: &TopTracesView) -> String {
        let output = json!({
            "summary": snapshot.summary,
            "trends": {
                "granularity": snapshot.granularity,
                "data": snapshot.trends,
            },
            "models": snapshot.model_breakdown,
            "top_traces": {
                "sort_by": view.field(),
                "direction": view.direction(),
                "traces": view.visible(),
            },
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn format_trace_detail(&self, detail: &TraceDetail) -> String {
        let output = json!({
            "trace": detail.trace,
            "spans": detail.spans,
            "stats": detail.stats(),
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn format_traces(&self, traces: &[TraceListItem]) -> String {
        serde_json::to_string_pretty(traces).unwrap_or_default()
    }

    fn format_projects(&self, projects: &[Project]) -> String {
        serde_json::to_string_pretty(projects).unwrap_or_default()
    }

    fn format_export(&self, path: &Path, contents: &ExportContents) -> String {
        let output = json!({
            "path": path.display().to_string(),
            "summary": contents.summary,
            "model_rows": contents.model_rows,
            "trace_rows": contents.trace_rows,
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn format_filter(&self, filter: &FilterState) -> String {
        serde_json::to_string(filter).unwrap_or_default()
    }
}

/// Pick a formatter for the `--json` flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
