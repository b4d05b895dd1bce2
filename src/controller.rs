//! Debounced dashboard controller
//!
//! The controller owns the current [`FilterState`] and decides when to
//! fetch. It runs as a single tokio task that selects over three sources:
//!
//! - commands from [`DebouncedController`] handles (filter changes,
//!   refresh, shutdown)
//! - the debounce deadline, when one is pending
//! - the set of fetches still in flight
//!
//! Each fetch carries a sequence number. Only the response to the most
//! recently issued fetch is committed to the [`ResultStore`]; older
//! responses are dropped when they arrive. Since the actor is the only
//! writer, the sequence check at the commit point is sufficient.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use traceboard::controller::{ControllerConfig, DebouncedController};
//! use traceboard_client::{AnalyticsQueryClient, ClientConfig, HttpAnalyticsService};
//! use traceboard_core::{FilterState, TimeRange};
//!
//! # async fn example() -> traceboard_core::Result<()> {
//! let config = ClientConfig::default();
//! let service = Arc::new(HttpAnalyticsService::new(&config)?);
//! let client = AnalyticsQueryClient::new(service, config.top_traces);
//!
//! let controller =
//!     DebouncedController::spawn(client, FilterState::default(), ControllerConfig::default());
//! controller.set_time_range(TimeRange::Last7d).await?;
//!
//! let mut results = controller.subscribe();
//! results.changed().await.ok();
//! controller.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::store::ResultStore;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use traceboard_client::AnalyticsQueryClient;
use traceboard_core::filters::FilterChange;
use traceboard_core::{AnalyticsSnapshot, FilterState, ProjectId, Result, TimeRange, TraceboardError};
use tracing::{debug, info, warn};

/// Quiet period after the last filter change before a fetch is issued
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub debounce: Duration,
    /// Fetch once immediately on spawn
    pub initial_fetch: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            initial_fetch: true,
        }
    }
}

/// Scheduling phase of the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// A debounce deadline is pending
    Scheduled,
    /// The latest issued fetch has not resolved yet
    InFlight,
}

enum Command {
    Update {
        change: FilterChange,
        reply: oneshot::Sender<Result<bool>>,
    },
    Refresh,
    Shutdown,
}

type FetchOutcome = (u64, FilterState, Result<AnalyticsSnapshot>);

/// Handle to the controller task
pub struct DebouncedController {
    commands: mpsc::UnboundedSender<Command>,
    store: watch::Receiver<ResultStore>,
    filter: watch::Receiver<FilterState>,
    phase: watch::Receiver<Phase>,
    task: JoinHandle<()>,
}

impl DebouncedController {
    /// Start the controller task with `initial` as the filter
    pub fn spawn(
        client: AnalyticsQueryClient,
        initial: FilterState,
        config: ControllerConfig,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (store_tx, store) = watch::channel(ResultStore::default());
        let (filter_tx, filter) = watch::channel(initial.clone());
        let (phase_tx, phase) = watch::channel(Phase::Idle);

        let actor = Actor {
            client,
            config,
            filter: initial,
            deadline: None,
            latest_issued: 0,
            awaiting_latest: false,
            store_tx,
            filter_tx,
            phase_tx,
        };
        let task = tokio::spawn(actor.run(command_rx));

        Self {
            commands,
            store,
            filter,
            phase,
            task,
        }
    }

    /// Apply a filter change
    ///
    /// Returns whether the filter actually changed. Rejected changes leave
    /// the filter as it was.
    pub async fn update(&self, change: FilterChange) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Update { change, reply })
            .map_err(|_| TraceboardError::ControllerClosed)?;
        response
            .await
            .map_err(|_| TraceboardError::ControllerClosed)?
    }

    pub async fn set_time_range(&self, range: TimeRange) -> Result<bool> {
        self.update(FilterChange::TimeRange(range)).await
    }

    pub async fn set_custom_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.update(FilterChange::CustomRange { start, end }).await
    }

    pub async fn toggle_project(&self, id: ProjectId) -> Result<bool> {
        self.update(FilterChange::ToggleProject(id)).await
    }

    pub async fn set_projects(&self, ids: Vec<ProjectId>) -> Result<bool> {
        self.update(FilterChange::Projects(ids)).await
    }

    pub async fn clear(&self) -> Result<bool> {
        self.update(FilterChange::Clear).await
    }

    /// Fetch now with the current filter, cancelling any pending deadline
    pub fn refresh(&self) -> Result<()> {
        self.commands
            .send(Command::Refresh)
            .map_err(|_| TraceboardError::ControllerClosed)
    }

    /// Current filter
    pub fn filter(&self) -> FilterState {
        self.filter.borrow().clone()
    }

    /// Current result state
    pub fn store(&self) -> ResultStore {
        self.store.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver notified on every store change
    pub fn subscribe(&self) -> watch::Receiver<ResultStore> {
        self.store.clone()
    }

    pub fn subscribe_filter(&self) -> watch::Receiver<FilterState> {
        self.filter.clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Stop the task and wait for it to exit
    ///
    /// Fetches still in flight are abandoned.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Controller task ended abnormally: {}", e);
        }
    }
}

struct Actor {
    client: AnalyticsQueryClient,
    config: ControllerConfig,
    filter: FilterState,
    deadline: Option<Instant>,
    latest_issued: u64,
    awaiting_latest: bool,
    store_tx: watch::Sender<ResultStore>,
    filter_tx: watch::Sender<FilterState>,
    phase_tx: watch::Sender<Phase>,
}

impl Actor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome>> =
            FuturesUnordered::new();

        if self.config.initial_fetch {
            self.issue_fetch(&mut in_flight);
        }
        self.publish_phase();

        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Update { change, reply }) => {
                        let _ = reply.send(self.apply(change));
                    }
                    Some(Command::Refresh) => {
                        debug!("Manual refresh");
                        self.deadline = None;
                        self.issue_fetch(&mut in_flight);
                    }
                    Some(Command::Shutdown) | None => {
                        debug!("Controller shutting down");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    self.deadline = None;
                    self.issue_fetch(&mut in_flight);
                }
                Some((seq, filter, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.complete(seq, filter, result);
                }
            }
            self.publish_phase();
        }
    }

    fn apply(&mut self, change: FilterChange) -> Result<bool> {
        let next = change.apply(&self.filter)?;
        if next == self.filter {
            debug!("Filter unchanged, not rescheduling");
            return Ok(false);
        }

        self.filter = next;
        self.filter_tx.send_replace(self.filter.clone());
        self.deadline = Some(Instant::now() + self.config.debounce);
        debug!("Fetch scheduled in {:?}", self.config.debounce);
        Ok(true)
    }

    fn issue_fetch(&mut self, in_flight: &mut FuturesUnordered<BoxFuture<'static, FetchOutcome>>) {
        if !self.filter.is_queryable() {
            debug!("Custom range incomplete, skipping fetch");
            return;
        }

        self.latest_issued += 1;
        self.awaiting_latest = true;
        self.store_tx.send_modify(|store| store.set_loading(true));

        let seq = self.latest_issued;
        let filter = self.filter.clone();
        let client = self.client.clone();
        debug!("Issuing fetch #{}", seq);

        in_flight.push(
            async move {
                let result = client.fetch_snapshot(&filter).await;
                (seq, filter, result)
            }
            .boxed(),
        );
    }

    fn complete(&mut self, seq: u64, filter: FilterState, result: Result<AnalyticsSnapshot>) {
        if seq != self.latest_issued {
            warn!(
                "Discarding stale response #{} (latest is #{})",
                seq, self.latest_issued
            );
            return;
        }

        self.awaiting_latest = false;
        match result {
            Ok(snapshot) => {
                info!(
                    "Committed snapshot #{}: {} traces",
                    seq, snapshot.summary.total_traces
                );
                self.store_tx
                    .send_modify(|store| store.commit(seq, filter, snapshot, Utc::now()));
            }
            Err(e) => {
                warn!("Fetch #{} failed: {}", seq, e);
                self.store_tx.send_modify(|store| store.fail(&e));
            }
        }
    }

    fn publish_phase(&self) {
        let phase = if self.awaiting_latest {
            Phase::InFlight
        } else if self.deadline.is_some() {
            Phase::Scheduled
        } else {
            Phase::Idle
        };
        self.phase_tx.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
    }
}
