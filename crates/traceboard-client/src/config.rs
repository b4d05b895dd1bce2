//! Client configuration

use std::time::Duration;
use traceboard_core::query::TopTracesRequest;

/// Default analytics service location
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for talking to the analytics query service
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL, without a trailing slash
    pub base_url: String,
    /// Transport timeout applied to every request
    pub request_timeout: Duration,
    /// Limit and ranking metric of the top-traces read
    pub top_traces: TopTracesRequest,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            top_traces: TopTracesRequest::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_top_traces(mut self, request: TopTracesRequest) -> Self {
        self.top_traces = request;
        self
    }
}
