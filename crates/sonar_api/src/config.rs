use std::time::Duration;

use crate::url::DEFAULT_API_BASE_URL;

/// Connection establishment deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Whole-request deadline. The remote may hold the connection open for tens
/// of seconds while it performs search, so this stays long but bounded.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Transport configuration for search API requests.
#[derive(Debug, Clone)]
pub struct SonarApiConfig {
    /// Bearer token passed to `Authorization`.
    pub api_key: String,
    /// Base URL for chat completion endpoints.
    pub base_url: String,
    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,
    /// Deadline for the whole streaming request.
    pub request_timeout: Duration,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
}

impl Default for SonarApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: None,
        }
    }
}

impl SonarApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
