//! Reading back analytics export payloads
//!
//! The export service produces either a JSON document or a sectioned CSV
//! file. This module re-imports the parts needed to check an export against
//! the live summary: the summary metrics and the row counts of the model
//! and top-trace sections.

use crate::analytics_types::{ModelStat, Summary, TraceStat};
use crate::error::{Result, TraceboardError};
use crate::query::ExportFormat;
use serde::Deserialize;

const SUMMARY_SECTION: &str = "Analytics Summary";
const MODELS_SECTION: &str = "Model Breakdown";
const TRACES_SECTION: &str = "Top Traces";

/// What an export file contains, as far as verification needs
#[derive(Debug, Clone, PartialEq)]
pub struct ExportContents {
    pub summary: Summary,
    pub model_rows: usize,
    pub trace_rows: usize,
}

#[derive(Deserialize)]
struct JsonExport {
    summary: Summary,
    #[serde(default)]
    models: Vec<ModelStat>,
    #[serde(default)]
    top_traces: Vec<TraceStat>,
}

/// Parse an export payload of the given format
pub fn parse_export(bytes: &[u8], format: ExportFormat) -> Result<ExportContents> {
    match format {
        ExportFormat::Json => parse_json_export(bytes),
        ExportFormat::Csv => parse_csv_export(bytes),
    }
}

fn parse_json_export(bytes: &[u8]) -> Result<ExportContents> {
    let doc: JsonExport = serde_json::from_slice(bytes)?;
    Ok(ExportContents {
        summary: doc.summary,
        model_rows: doc.models.len(),
        trace_rows: doc.top_traces.len(),
    })
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Summary,
    Models,
    Traces,
}

fn parse_csv_export(bytes: &[u8]) -> Result<ExportContents> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| TraceboardError::Csv(format!("export is not UTF-8: {e}")))?;

    let mut summary = Summary::default();
    let mut seen_summary = false;
    let mut model_rows = 0;
    let mut trace_rows = 0;
    let mut section = Section::None;
    let mut header_pending = false;

    for fields in split_csv_records(text)? {
        if fields.is_empty() {
            section = Section::None;
            continue;
        }

        if section == Section::None {
            section = match fields[0].as_str() {
                SUMMARY_SECTION => Section::Summary,
                MODELS_SECTION => Section::Models,
                TRACES_SECTION => Section::Traces,
                other => {
                    return Err(TraceboardError::Csv(format!("unknown section '{other}'")));
                }
            };
            header_pending = true;
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }

        match section {
            Section::Summary => {
                seen_summary = true;
                apply_summary_row(&mut summary, &fields)?;
            }
            Section::Models => model_rows += 1,
            Section::Traces => trace_rows += 1,
            Section::None => {}
        }
    }

    if !seen_summary {
        return Err(TraceboardError::Csv("missing summary section".to_string()));
    }

    Ok(ExportContents {
        summary,
        model_rows,
        trace_rows,
    })
}

fn apply_summary_row(summary: &mut Summary, fields: &[String]) -> Result<()> {
    let [label, value] = fields else {
        return Err(TraceboardError::Csv(format!(
            "summary row needs 2 fields, got {}",
            fields.len()
        )));
    };

    let int = |v: &str| {
        v.parse::<u64>()
            .map_err(|e| TraceboardError::Csv(format!("'{label}': {e}")))
    };
    let float = |v: &str| {
        v.parse::<f64>()
            .map_err(|e| TraceboardError::Csv(format!("'{label}': {e}")))
    };

    match label.as_str() {
        "Total Traces" => summary.total_traces = int(value)?,
        "Total LLM Calls" => summary.total_llm_calls = int(value)?,
        "Total Tool Calls" => summary.total_tool_calls = int(value)?,
        "Total Input Tokens" => summary.total_input_tokens = int(value)?,
        "Total Output Tokens" => summary.total_output_tokens = int(value)?,
        "Total Tokens" => summary.total_tokens = int(value)?,
        "Total Cost ($)" => summary.total_cost = float(value)?,
        "Avg Duration (ms)" => summary.avg_duration_ms = float(value)?,
        "Min Duration (ms)" => summary.min_duration_ms = float(value)?,
        "Max Duration (ms)" => summary.max_duration_ms = float(value)?,
        "Total Duration (ms)" => summary.total_duration_ms = float(value)?,
        "Unique Projects" => summary.unique_projects = int(value)?,
        // Newer exports may add metrics
        _ => {}
    }
    Ok(())
}

/// Split CSV text into records, honouring double-quoted fields
///
/// Line breaks inside quotes belong to the field. A blank line yields an
/// empty record, which ends the current section.
fn split_csv_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // A record holding only `""` is not blank
    let mut started = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => {
                in_quotes = true;
                started = true;
            }
            (',', false) => {
                fields.push(std::mem::take(&mut current));
                started = true;
            }
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                if started || !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
                records.push(std::mem::take(&mut fields));
                started = false;
            }
            (c, _) => current.push(c),
        }
    }

    if in_quotes {
        let head = fields.first().unwrap_or(&current);
        return Err(TraceboardError::Csv(format!(
            "unterminated quote in record starting '{head}'"
        )));
    }
    if started || !current.is_empty() {
        fields.push(current);
        records.push(fields);
    }
    Ok(records)
}
