use std::time::Duration;

use super::client::HttpClient;
use async_trait::async_trait;
use tracing::warn;

/// Per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("aqdash/", env!("CARGO_PKG_VERSION"));

/// reqwest client configured for the air-quality service.
#[derive(Debug, Clone)]
pub struct BasicClient(reqwest::Client);

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to an unconfigured HTTP client");
                reqwest::Client::new()
            });
        Self(client)
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self(client)
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
