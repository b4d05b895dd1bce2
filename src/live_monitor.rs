//! Watch mode
//!
//! Keeps a [`DebouncedController`] running, re-renders every committed
//! snapshot and refreshes on a fixed interval. Filter edits typed on stdin
//! go through the controller, so quick successive edits collapse into one
//! fetch.

use crate::controller::DebouncedController;
use crate::output::get_formatter;
use crate::store::ResultStore;
use crate::cli::parse_date_filter;
use chrono::Local;
use colored::Colorize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{MissedTickBehavior, interval};
use traceboard_core::filters::FilterChange;
use traceboard_core::query::TopTracesMetric;
use traceboard_core::sorter::{SortField, TopTracesView};
use traceboard_core::{ProjectId, Result, TimeRange, TraceboardError};
use tracing::{debug, warn};

const HELP: &str = "Commands: range <last_24h|last_7d|last_30d|all_time>, \
custom <start> [end], project <id>, projects <id,id,..>, clear, \
sort <tokens|cost|duration>, all, refresh, quit";

/// One line of watch-mode input
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorInput {
    /// Filter edits, applied in order
    Changes(Vec<FilterChange>),
    Refresh,
    Sort(SortField),
    ToggleAll,
    Help,
    Quit,
}

/// Parse a watch-mode command line; blank lines yield `None`
pub fn parse_input(line: &str) -> Result<Option<MonitorInput>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let missing = |what: &str| TraceboardError::InvalidArgument(format!("'{command}' needs {what}"));

    let input = match command {
        "range" => {
            let range: TimeRange = arg
                .ok_or_else(|| missing("a range"))?
                .parse()
                .map_err(TraceboardError::InvalidArgument)?;
            MonitorInput::Changes(vec![FilterChange::TimeRange(range)])
        }
        "custom" => {
            let start = arg.map(|s| parse_date_filter(s, false)).transpose()?;
            let end = words
                .next()
                .map(|s| parse_date_filter(s, true))
                .transpose()?;
            MonitorInput::Changes(vec![
                FilterChange::TimeRange(TimeRange::Custom),
                FilterChange::CustomRange { start, end },
            ])
        }
        "project" => {
            let id = arg.ok_or_else(|| missing("a project ID"))?;
            MonitorInput::Changes(vec![FilterChange::ToggleProject(ProjectId::new(id))])
        }
        "projects" => {
            let ids = arg
                .map(|list| {
                    list.split(',')
                        .filter(|id| !id.is_empty())
                        .map(ProjectId::new)
                        .collect()
                })
                .unwrap_or_default();
            MonitorInput::Changes(vec![FilterChange::Projects(ids)])
        }
        "clear" => MonitorInput::Changes(vec![FilterChange::Clear]),
        "sort" => {
            let metric: TopTracesMetric = arg
                .ok_or_else(|| missing("a field"))?
                .parse()
                .map_err(TraceboardError::InvalidArgument)?;
            MonitorInput::Sort(metric.into())
        }
        "all" => MonitorInput::ToggleAll,
        "refresh" | "r" => MonitorInput::Refresh,
        "help" | "?" => MonitorInput::Help,
        "quit" | "q" | "exit" => MonitorInput::Quit,
        other => {
            return Err(TraceboardError::InvalidArgument(format!(
                "unknown command '{other}'"
            )));
        }
    };
    Ok(Some(input))
}

/// Live dashboard state
pub struct LiveMonitor {
    controller: DebouncedController,
    json_output: bool,
    interval_secs: u64,
    view: TopTracesView,
    last: ResultStore,
    message: Option<String>,
}

impl LiveMonitor {
    pub fn new(
        controller: DebouncedController,
        json_output: bool,
        interval_secs: u64,
        sort: SortField,
    ) -> Self {
        Self {
            controller,
            json_output,
            interval_secs,
            view: TopTracesView::new(Vec::new()).with_sort(sort, Default::default()),
            last: ResultStore::default(),
            message: None,
        }
    }

    /// Run until Ctrl+C, `quit`, or the controller stops
    pub async fn run(mut self) -> Result<()> {
        let mut results = self.controller.subscribe();
        let mut ticker = interval(Duration::from_secs(self.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The controller already fetched on start
        ticker.tick().await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        self.render();

        loop {
            tokio::select! {
                changed = results.changed() => {
                    if changed.is_err() {
                        warn!("Controller stopped");
                        break;
                    }
                    self.last = results.borrow_and_update().clone();
                    self.render();
                }
                _ = ticker.tick() => {
                    debug!("Interval refresh");
                    self.controller.refresh()?;
                }
                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => {
                        if !self.handle_line(&line).await? {
                            break;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        stdin_open = false;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    println!("\nExiting watch mode...");
                    break;
                }
            }
        }

        self.controller.shutdown().await;
        Ok(())
    }

    /// Returns false when the user asked to quit
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        self.message = None;
        match parse_input(line) {
            Ok(None) => {}
            Ok(Some(MonitorInput::Quit)) => return Ok(false),
            Ok(Some(MonitorInput::Help)) => self.message = Some(HELP.to_string()),
            Ok(Some(MonitorInput::Refresh)) => self.controller.refresh()?,
            Ok(Some(MonitorInput::Sort(field))) => self.view.toggle_sort(field),
            Ok(Some(MonitorInput::ToggleAll)) => self.view.toggle_expanded(),
            Ok(Some(MonitorInput::Changes(changes))) => {
                for change in changes {
                    match self.controller.update(change).await {
                        Ok(_) => {}
                        Err(TraceboardError::ControllerClosed) => {
                            return Err(TraceboardError::ControllerClosed);
                        }
                        Err(e) => {
                            self.message = Some(e.to_string());
                            break;
                        }
                    }
                }
            }
            Err(e) => self.message = Some(e.to_string()),
        }
        self.render();
        Ok(true)
    }

    fn render(&mut self) {
        let formatter = get_formatter(self.json_output);

        if let Some(snapshot) = self.last.snapshot() {
            self.view.set_traces(snapshot.top_traces.clone());
        }

        if self.json_output {
            if let Some(snapshot) = self.last.snapshot() {
                println!("{}", formatter.format_snapshot(snapshot, &self.view));
            }
            return;
        }

        print!("\x1B[2J\x1B[1;1H");
        let updated = self
            .last
            .last_updated()
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!("{} - Last updated: {}", "traceboard watch".bold(), updated);
        println!(
            "Refresh interval: {}s | Type 'help' for commands, Ctrl+C to exit",
            self.interval_secs
        );
        println!("{}", formatter.format_filter(&self.controller.filter()));
        println!("{}", "-".repeat(80));

        if self.last.is_loading() {
            println!("{}", "Loading...".dimmed());
        }
        if let Some(error) = self.last.error() {
            println!("{}", format!("Error: {}", error.message).red());
        }
        if let Some(message) = &self.message {
            println!("{}", message.yellow());
        }

        match self.last.snapshot() {
            Some(snapshot) => println!("{}", formatter.format_snapshot(snapshot, &self.view)),
            None if !self.last.is_loading() => println!("No data yet."),
            None => {}
        }
    }
}
