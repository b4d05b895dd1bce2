//! Observable result state of the dashboard
//!
//! [`ResultStore`] is written only by the controller's actor task and read
//! through `tokio::sync::watch` receivers. A failed fetch never clears the
//! last good snapshot; it only records the failure next to it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use traceboard_core::error::ErrorKind;
use traceboard_core::{AnalyticsSnapshot, FilterState, TraceboardError};

/// Cloneable record of the last fetch failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TraceboardError> for FetchFailure {
    fn from(error: &TraceboardError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Latest committed snapshot plus loading and error flags
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    snapshot: Option<Arc<AnalyticsSnapshot>>,
    snapshot_filter: Option<FilterState>,
    loading: bool,
    error: Option<FetchFailure>,
    last_updated: Option<DateTime<Utc>>,
    sequence: u64,
}

impl ResultStore {
    pub fn snapshot(&self) -> Option<&Arc<AnalyticsSnapshot>> {
        self.snapshot.as_ref()
    }

    /// Filter the current snapshot was fetched with
    pub fn snapshot_filter(&self) -> Option<&FilterState> {
        self.snapshot_filter.as_ref()
    }

    /// A fetch for the newest filter is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Request sequence number of the committed snapshot, 0 before the first
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn has_data(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn commit(
        &mut self,
        sequence: u64,
        filter: FilterState,
        snapshot: AnalyticsSnapshot,
        now: DateTime<Utc>,
    ) {
        self.snapshot = Some(Arc::new(snapshot));
        self.snapshot_filter = Some(filter);
        self.sequence = sequence;
        self.last_updated = Some(now);
        self.error = None;
        self.loading = false;
    }

    pub(crate) fn fail(&mut self, error: &TraceboardError) {
        self.error = Some(FetchFailure::from(error));
        self.loading = false;
    }
}
