use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobboard::config::{Command, Config};
use jobboard::jobs::JobCollection;
use jobboard::sources::{HttpJobSource, JobSource};
use jobboard::state::AppState;
use jobboard::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use jobboard::stores::{ApplicationsStore, SavedJobsStore, ThemeStore};
use jobboard::{browse, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobboard=info,tower_http=info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let source = HttpJobSource::new(
        config.api_url.clone(),
        Duration::from_secs(config.request_timeout),
    )?;
    tracing::info!("Using job API at {}", source.endpoint());
    let source: Arc<dyn JobSource> = Arc::new(source);

    let storage: Arc<dyn KeyValueStorage> = if config.ephemeral {
        tracing::info!("Running with in-memory storage");
        Arc::new(MemoryStorage::new())
    } else {
        let storage = FileStorage::new(&config.data_dir)?;
        tracing::info!("Storing local data in {}", storage.dir().display());
        Arc::new(storage)
    };

    let state = AppState {
        jobs: Arc::new(JobCollection::new(source, config.page_size)),
        saved: Arc::new(SavedJobsStore::open(storage.clone()).await),
        applications: Arc::new(ApplicationsStore::open(storage.clone()).await),
        theme: Arc::new(ThemeStore::open(storage).await),
    };

    match config.resolved_command() {
        Command::Serve { listen_addr } => serve(state, &listen_addr).await,
        Command::Browse(args) => {
            browse::run(&state.jobs, &state.saved, &state.applications, &args).await
        }
    }
}

async fn serve(state: AppState, listen_addr: &str) -> anyhow::Result<()> {
    watch_collection(&state);

    // Initial load happens in the background so the server starts answering at once.
    let jobs = state.jobs.clone();
    tokio::spawn(async move { jobs.refetch().await });

    let app = routes::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting gracefully");
        })
        .await?;

    Ok(())
}

/// Log every settled change to the job collection.
fn watch_collection(state: &AppState) {
    let mut rx = state.jobs.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let s = rx.borrow_and_update();
            if s.loading || s.loading_more {
                continue;
            }
            match &s.error {
                Some(error) => tracing::warn!("Job collection error: {error}"),
                None => tracing::debug!(
                    "Job collection holds {} of {} jobs (more: {})",
                    s.jobs.len(),
                    s.total_count,
                    s.has_more
                ),
            }
        }
    });
}
