// Remote job sources: anything that can serve pages of job records.

pub mod http;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::job::JobPage;

pub use http::HttpJobSource;

/// Page size used when neither the caller nor the API says otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// A paginated source of job listings.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Fetch the page starting at `offset`, asking for at most `limit` jobs.
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<JobPage, FetchError>;
}
