pub mod application;
pub mod job;
pub mod saved_job;
pub mod theme;

pub use application::{Application, ApplicationForm};
pub use job::{Job, JobPage, JobRecord};
pub use saved_job::SavedJob;
pub use theme::ThemeMode;
