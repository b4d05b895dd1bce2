//! Analytics service trait
//!
//! This module defines the `AnalyticsService` trait, the seam between the
//! analytics pipeline and the external query service. The HTTP client in
//! `traceboard-client` implements it for production; tests implement it in
//! memory.

use crate::analytics_types::{ModelsResponse, Summary, TopTracesResponse, TrendsResponse};
use crate::error::Result;
use crate::query::{ExportFormat, QueryParams, TopTracesRequest, TracePage};
use crate::trace_types::{Project, TraceDetail, TraceListItem};
use crate::types::{ProjectId, TraceId};
use async_trait::async_trait;

/// Read operations of the external analytics query service
///
/// Every analytics read receives the same [`QueryParams`]; implementations
/// must not reinterpret them per endpoint.
#[async_trait]
pub trait AnalyticsService: Send + Sync {
    /// Aggregate metrics
    async fn summary(&self, params: &QueryParams) -> Result<Summary>;

    /// Time-bucketed trend series with the chosen granularity
    async fn trends(&self, params: &QueryParams) -> Result<TrendsResponse>;

    /// Per-model cost breakdown, cost descending
    async fn models(&self, params: &QueryParams) -> Result<ModelsResponse>;

    /// Highest usage traces ranked by `request.sort_by`
    async fn top_traces(
        &self,
        params: &QueryParams,
        request: &TopTracesRequest,
    ) -> Result<TopTracesResponse>;

    /// Server-side export; returns the raw file payload
    async fn export(&self, params: &QueryParams, format: ExportFormat) -> Result<Vec<u8>>;

    /// One page of a project's traces, newest first
    async fn traces(&self, project: &ProjectId, page: TracePage) -> Result<Vec<TraceListItem>>;

    /// Single trace with all of its spans
    async fn trace_detail(&self, trace_id: &TraceId) -> Result<TraceDetail>;

    /// Projects available for filtering
    async fn projects(&self) -> Result<Vec<Project>>;
}
