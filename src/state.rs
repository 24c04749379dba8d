use std::sync::Arc;

use crate::jobs::JobCollection;
use crate::stores::{ApplicationsStore, SavedJobsStore, ThemeStore};

/// Services shared by every request handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobCollection>,
    pub saved: Arc<SavedJobsStore>,
    pub applications: Arc<ApplicationsStore>,
    pub theme: Arc<ThemeStore>,
}
