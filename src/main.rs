//! traceboard - Analytics dashboard for LLM-agent execution traces

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use traceboard::{
    cli::{Cli, Command},
    controller::DebouncedController,
    live_monitor::LiveMonitor,
    output::get_formatter,
};
use traceboard_client::{AnalyticsQueryClient, Exporter, HttpAnalyticsService};
use traceboard_core::sorter::{SortDirection, TopTracesView};
use traceboard_core::query::TracePage;
use traceboard_core::{AnalyticsService, ProjectId, Result, TraceId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Spinner for one-shot requests on an interactive terminal
fn spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The --quiet flag should override RUST_LOG.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("traceboard=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let filter = cli.filter()?;
    let client_config = cli.client_config()?;
    info!("Using analytics service at {}", client_config.base_url);

    let service: Arc<dyn AnalyticsService> = Arc::new(HttpAnalyticsService::new(&client_config)?);
    let client = AnalyticsQueryClient::new(service.clone(), client_config.top_traces);
    let controller_config = cli.controller_config();
    let formatter = get_formatter(cli.json);
    let show_progress = !cli.json && is_terminal::is_terminal(std::io::stderr());

    match cli.command {
        Command::Summary { sort, asc, all } => {
            let bar = spinner(show_progress, "Fetching analytics...");
            let result = client.fetch_snapshot(&filter).await;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let snapshot = result?;

            let direction = if asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            let mut view =
                TopTracesView::new(snapshot.top_traces.clone()).with_sort(sort.into(), direction);
            if all {
                view.toggle_expanded();
            }

            if !cli.json {
                println!("{}", formatter.format_filter(&filter));
            }
            println!("{}", formatter.format_snapshot(&snapshot, &view));
        }
        Command::Export { format, ref output } => {
            let bar = spinner(show_progress, "Exporting...");
            let result = Exporter::new(service).export(&filter, format).await;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let file = result?;
            let path = file.save(output).await?;
            let contents = file.summary()?;
            println!("{}", formatter.format_export(&path, &contents));
        }
        Command::Trace { ref trace_id } => {
            let detail = client.trace_detail(&TraceId::new(trace_id.as_str())).await?;
            println!("{}", formatter.format_trace_detail(&detail));
        }
        Command::Traces {
            ref project,
            skip,
            page_size,
        } => {
            let page = TracePage::new(skip, page_size)?;
            let traces = client
                .traces(&ProjectId::new(project.as_str()), page)
                .await?;
            println!("{}", formatter.format_traces(&traces));
            if !cli.json && traces.len() == page_size as usize {
                println!("Next page: --skip {}", page.next().skip);
            }
        }
        Command::Projects => {
            let projects = client.projects().await?;
            println!("{}", formatter.format_projects(&projects));
        }
        Command::Watch { interval, sort, .. } => {
            info!("Starting watch mode");
            let controller = DebouncedController::spawn(client, filter, controller_config);
            LiveMonitor::new(controller, cli.json, interval, sort.into())
                .run()
                .await?;
        }
    }

    Ok(())
}
