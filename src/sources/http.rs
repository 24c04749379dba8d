use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::models::job::JobPage;
use crate::sources::JobSource;

pub const DEFAULT_API_URL: &str = "https://empllo.com/api/v1";

/// Job source backed by `GET <endpoint>?offset=&limit=`.
pub struct HttpJobSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpJobSource {
    /// Build a source with a per-request timeout. The timeout is the only
    /// bound on a hanging request; nothing above this layer cancels fetches.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("jobboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<JobPage, FetchError> {
        tracing::debug!("Fetching jobs from {} (offset={offset}, limit={limit})", self.endpoint);

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("offset", offset), ("limit", limit)])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let data: Value = resp.json().await?;
        let page = JobPage::from_value(&data);

        tracing::debug!(
            "Received {} jobs (limit={:?}, total_count={:?})",
            page.jobs.len(),
            page.limit,
            page.total_count
        );
        Ok(page)
    }
}
