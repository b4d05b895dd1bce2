//! Common test utilities and helpers for traceboard tests
//!
//! Provides an in-memory [`AnalyticsService`] with per-call delays, failure
//! injection and call recording, plus builders for service payloads.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use traceboard::controller::{ControllerConfig, DebouncedController};
use traceboard_client::AnalyticsQueryClient;
use traceboard_core::analytics_types::{
    ModelStat, ModelsResponse, Summary, TopTracesResponse, TraceStat, TrendPoint, TrendsResponse,
};
use traceboard_core::query::{ExportFormat, QueryParams, TopTracesRequest, TracePage};
use traceboard_core::trace_types::{Project, TraceDetail, TraceListItem};
use traceboard_core::{
    AnalyticsService, FilterState, Granularity, ProjectId, Result, TraceId, TraceStatus,
    TraceboardError,
};

/// Common test projects
pub const TEST_PROJECTS: &[&str] = &["project-alpha", "project-beta", "project-gamma"];

/// Top-trace row
pub fn trace_stat(id: &str, tokens: u64, cost: f64, duration_ms: f64) -> TraceStat {
    TraceStat {
        trace_id: TraceId::new(id),
        name: format!("{id}_run"),
        total_tokens: tokens,
        total_cost: cost,
        duration_ms,
        llm_call_count: 1,
        start_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        project_name: TEST_PROJECTS[0].to_string(),
        status: TraceStatus::Success,
    }
}

/// Summary whose `total_traces` identifies the fetch that produced it
pub fn summary_with_traces(total_traces: u64) -> Summary {
    Summary {
        total_traces,
        total_llm_calls: total_traces * 2,
        total_tokens: total_traces * 100,
        total_cost: total_traces as f64 * 0.01,
        ..Summary::default()
    }
}

/// Four daily trend buckets starting 2024-05-01
pub fn daily_trends() -> TrendsResponse {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    TrendsResponse {
        data: (0..4)
            .map(|i| TrendPoint {
                timestamp: start + ChronoDuration::days(i),
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
                cost: 0.001,
                trace_count: 1,
            })
            .collect(),
        granularity: Granularity::Day,
    }
}

pub fn models() -> ModelsResponse {
    ModelsResponse {
        models: vec![ModelStat {
            model_name: "gemini-2.0-flash".to_string(),
            provider: "google".to_string(),
            total_cost: 0.01,
            cost_percentage: 100.0,
            input_tokens: 40,
            output_tokens: 20,
            total_tokens: 60,
            call_count: 4,
        }],
    }
}

/// In-memory analytics service
///
/// Every snapshot read records its parameters. The summary read sleeps for
/// the next queued delay (or the default delay) and reports the number of
/// summary calls so far as `total_traces`, so tests can tell fetches apart.
#[derive(Default)]
pub struct MockService {
    summary_calls: Mutex<Vec<QueryParams>>,
    trend_calls: Mutex<Vec<QueryParams>>,
    delays: Mutex<VecDeque<Duration>>,
    default_delay: Mutex<Duration>,
    counter: AtomicU64,
    fail_trends: AtomicBool,
    top_traces: Mutex<Vec<TraceStat>>,
    export_payload: Mutex<Vec<u8>>,
}

impl MockService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delay applied to the next summary read only
    pub fn push_delay(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.lock().unwrap() = delay;
    }

    pub fn fail_trends(&self, fail: bool) {
        self.fail_trends.store(fail, Ordering::SeqCst);
    }

    pub fn set_top_traces(&self, traces: Vec<TraceStat>) {
        *self.top_traces.lock().unwrap() = traces;
    }

    pub fn set_export_payload(&self, bytes: Vec<u8>) {
        *self.export_payload.lock().unwrap() = bytes;
    }

    /// Parameters of every summary read, in call order
    pub fn summary_calls(&self) -> Vec<QueryParams> {
        self.summary_calls.lock().unwrap().clone()
    }

    pub fn trend_calls(&self) -> Vec<QueryParams> {
        self.trend_calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.summary_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalyticsService for MockService {
    async fn summary(&self, params: &QueryParams) -> Result<Summary> {
        self.summary_calls.lock().unwrap().push(params.clone());
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = self
            .delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| *self.default_delay.lock().unwrap());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(summary_with_traces(id))
    }

    async fn trends(&self, params: &QueryParams) -> Result<TrendsResponse> {
        self.trend_calls.lock().unwrap().push(params.clone());
        if self.fail_trends.load(Ordering::SeqCst) {
            return Err(TraceboardError::InvalidSnapshot(
                "trends backend unavailable".to_string(),
            ));
        }
        Ok(daily_trends())
    }

    async fn models(&self, _params: &QueryParams) -> Result<ModelsResponse> {
        Ok(models())
    }

    async fn top_traces(
        &self,
        _params: &QueryParams,
        request: &TopTracesRequest,
    ) -> Result<TopTracesResponse> {
        let mut traces = self.top_traces.lock().unwrap().clone();
        traces.truncate(request.limit as usize);
        Ok(TopTracesResponse { traces })
    }

    async fn export(&self, _params: &QueryParams, _format: ExportFormat) -> Result<Vec<u8>> {
        Ok(self.export_payload.lock().unwrap().clone())
    }

    async fn traces(&self, _project: &ProjectId, _page: TracePage) -> Result<Vec<TraceListItem>> {
        Ok(Vec::new())
    }

    async fn trace_detail(&self, trace_id: &TraceId) -> Result<TraceDetail> {
        Err(TraceboardError::TraceNotFound(trace_id.to_string()))
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        Ok(TEST_PROJECTS
            .iter()
            .map(|id| Project {
                id: ProjectId::new(*id),
                name: id.to_string(),
                description: None,
                is_active: true,
                created_at: None,
            })
            .collect())
    }
}

/// Controller over `service` without the initial fetch
pub fn spawn_controller(service: Arc<MockService>, filter: FilterState) -> DebouncedController {
    let client = AnalyticsQueryClient::new(service, TopTracesRequest::default());
    DebouncedController::spawn(
        client,
        filter,
        ControllerConfig {
            initial_fetch: false,
            ..ControllerConfig::default()
        },
    )
}
