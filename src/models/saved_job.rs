use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::job::Job;

/// A bookmarked job. Holds its own copy of the job as it looked when saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJob {
    pub job: Job,
    /// Epoch milliseconds.
    pub saved_at: i64,
}

impl SavedJob {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            saved_at: Utc::now().timestamp_millis(),
        }
    }
}
