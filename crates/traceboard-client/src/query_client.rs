//! Concurrent snapshot fetching
//!
//! A snapshot is four reads of the same [`QueryParams`]. They run
//! concurrently and the snapshot only exists when all four succeed; the
//! first failure is reported with the endpoint it came from.

use std::sync::Arc;
use traceboard_core::analytics_types::{AnalyticsSnapshot, ShapeWarning};
use traceboard_core::query::{TopTracesRequest, TracePage};
use traceboard_core::trace_types::{Project, TraceDetail, TraceListItem};
use traceboard_core::{
    AnalyticsService, Endpoint, FilterState, ProjectId, QueryParams, Result, TraceId,
    TraceboardError,
};
use tracing::{debug, warn};

/// Builds analytics snapshots from an [`AnalyticsService`]
#[derive(Clone)]
pub struct AnalyticsQueryClient {
    service: Arc<dyn AnalyticsService>,
    top_traces: TopTracesRequest,
}

impl AnalyticsQueryClient {
    pub fn new(service: Arc<dyn AnalyticsService>, top_traces: TopTracesRequest) -> Self {
        Self {
            service,
            top_traces,
        }
    }

    /// Fetch the full snapshot for `filter`
    ///
    /// # Errors
    ///
    /// - [`TraceboardError::InvalidArgument`] / [`TraceboardError::InvalidRange`]
    ///   when the filter cannot be turned into query parameters
    /// - [`TraceboardError::PartialSnapshotFailure`] when any read fails
    /// - [`TraceboardError::InvalidSnapshot`] when trend points go backwards
    pub async fn fetch_snapshot(&self, filter: &FilterState) -> Result<AnalyticsSnapshot> {
        let params = QueryParams::from_filter(filter)?;
        let snapshot = self.fetch_with_params(&params).await?;

        let expected = filter.expected_granularity();
        if snapshot.granularity != expected {
            debug!(
                "Service chose {} granularity, expected {}",
                snapshot.granularity, expected
            );
        }
        Ok(snapshot)
    }

    /// Fetch a snapshot for already derived parameters
    pub async fn fetch_with_params(&self, params: &QueryParams) -> Result<AnalyticsSnapshot> {
        debug!("Fetching snapshot with {:?}", params.to_pairs());
        let service = &self.service;

        let (summary, trends, models, top) = futures::try_join!(
            async {
                service
                    .summary(params)
                    .await
                    .map_err(|e| TraceboardError::partial(Endpoint::Summary, e))
            },
            async {
                service
                    .trends(params)
                    .await
                    .map_err(|e| TraceboardError::partial(Endpoint::Trends, e))
            },
            async {
                service
                    .models(params)
                    .await
                    .map_err(|e| TraceboardError::partial(Endpoint::Models, e))
            },
            async {
                service
                    .top_traces(params, &self.top_traces)
                    .await
                    .map_err(|e| TraceboardError::partial(Endpoint::TopTraces, e))
            },
        )?;

        let snapshot = AnalyticsSnapshot::from_parts(summary, trends, models, top);
        for warning in snapshot.check_shape()? {
            log_shape_warning(&warning);
        }
        Ok(snapshot)
    }

    /// One page of `project`'s traces
    pub async fn traces(
        &self,
        project: &ProjectId,
        page: TracePage,
    ) -> Result<Vec<TraceListItem>> {
        debug!("Listing traces of {} ({:?})", project, page);
        self.service.traces(project, page).await
    }

    /// Look up one trace with its spans
    pub async fn trace_detail(&self, trace_id: &TraceId) -> Result<TraceDetail> {
        self.service.trace_detail(trace_id).await
    }

    /// Projects that can be used as filters
    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.service.projects().await
    }
}

fn log_shape_warning(warning: &ShapeWarning) {
    match warning {
        ShapeWarning::DuplicateTrendBucket(ts) => {
            warn!("Duplicate trend bucket at {}", ts);
        }
        ShapeWarning::CostPercentageDrift { sum } => {
            warn!("Model cost percentages sum to {:.2}, expected 100", sum);
        }
        ShapeWarning::DuplicateTrace(id) => {
            warn!("Trace {} listed twice in top traces", id);
        }
    }
}
