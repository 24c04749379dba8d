use std::path::PathBuf;

use clap::Parser;

use crate::jobs::{JobQuery, SalarySort};
use crate::sources::DEFAULT_PAGE_SIZE;
use crate::sources::http::DEFAULT_API_URL;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobboard", about = "Job board service")]
pub struct Config {
    /// Remote job API endpoint
    #[arg(long, env = "JOBS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Jobs requested per page
    #[arg(long, env = "PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Directory holding saved jobs, applications and the theme preference
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Timeout for each request to the job API, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout: u64,

    /// Keep local state in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP API (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Fetch jobs once and print the ones matching the filters
    Browse(BrowseArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct BrowseArgs {
    /// Case-insensitive text matched against title, company and category
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub job_type: Option<String>,

    #[arg(long)]
    pub work_model: Option<String>,

    #[arg(long)]
    pub seniority: Option<String>,

    /// Order by salary: highest or lowest
    #[arg(long)]
    pub salary_sort: Option<SalarySort>,

    /// Number of pages to fetch before filtering
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

impl BrowseArgs {
    pub fn query(&self) -> JobQuery {
        JobQuery {
            search: self.search.clone(),
            category: self.category.clone(),
            job_type: self.job_type.clone(),
            work_model: self.work_model.clone(),
            seniority_level: self.seniority.clone(),
            salary_sort: self.salary_sort,
        }
        .normalized()
    }
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}
