//! reqwest implementation of the analytics service

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use traceboard_core::analytics_types::{
    ModelsResponse, Summary, TopTracesResponse, TrendsResponse,
};
use traceboard_core::query::{ExportFormat, QueryParams, TopTracesRequest, TracePage};
use traceboard_core::trace_types::{Project, TraceDetail, TraceListItem};
use traceboard_core::{AnalyticsService, Endpoint, ProjectId, Result, TraceId, TraceboardError};
use tracing::{debug, warn};

/// Talks to the analytics query service over HTTP
pub struct HttpAnalyticsService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalyticsService {
    /// Build a service client with the configured timeout
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Endpoint URL with one extra, percent-encoded path segment
    fn segment_url(&self, endpoint: Endpoint, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint_url(endpoint))
            .map_err(|e| TraceboardError::Config(format!("invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| TraceboardError::Config("API URL cannot be a base".to_string()))?
            .push(segment);
        Ok(url)
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        url: &str,
        pairs: &[(&'static str, String)],
    ) -> Result<reqwest::Response> {
        debug!("GET {} {:?}", url, pairs);
        let response = self.client.get(url).query(pairs).send().await?;
        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("{} request failed: {}", endpoint, e);
                Err(e.into())
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        pairs: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.endpoint_url(endpoint);
        let response = self.send(endpoint, &url, pairs).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AnalyticsService for HttpAnalyticsService {
    async fn summary(&self, params: &QueryParams) -> Result<Summary> {
        self.get_json(Endpoint::Summary, &params.to_pairs()).await
    }

    async fn trends(&self, params: &QueryParams) -> Result<TrendsResponse> {
        self.get_json(Endpoint::Trends, &params.to_pairs()).await
    }

    async fn models(&self, params: &QueryParams) -> Result<ModelsResponse> {
        self.get_json(Endpoint::Models, &params.to_pairs()).await
    }

    async fn top_traces(
        &self,
        params: &QueryParams,
        request: &TopTracesRequest,
    ) -> Result<TopTracesResponse> {
        let mut pairs = params.to_pairs();
        pairs.extend(request.to_pairs());
        self.get_json(Endpoint::TopTraces, &pairs).await
    }

    async fn export(&self, params: &QueryParams, format: ExportFormat) -> Result<Vec<u8>> {
        let mut pairs = params.to_pairs();
        pairs.push(("format", format.to_string()));

        let url = self.endpoint_url(Endpoint::Export);
        let response = self.send(Endpoint::Export, &url, &pairs).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn traces(
        &self,
        project: &ProjectId,
        page: TracePage,
    ) -> Result<Vec<TraceListItem>> {
        let url = self.segment_url(Endpoint::Traces, project.as_str())?;
        let response = self
            .send(Endpoint::Traces, url.as_str(), &page.to_pairs())
            .await?;
        Ok(response.json().await?)
    }

    async fn trace_detail(&self, trace_id: &TraceId) -> Result<TraceDetail> {
        let url = self.segment_url(Endpoint::TraceDetail, trace_id.as_str())?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TraceboardError::TraceNotFound(trace_id.to_string()));
        }
        Ok(response.error_for_status()?.json().await?)
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        self.get_json(Endpoint::Projects, &[]).await
    }
}
