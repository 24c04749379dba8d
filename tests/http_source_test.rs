use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use jobboard::error::FetchError;
use jobboard::jobs::JobCollection;
use jobboard::sources::{HttpJobSource, JobSource};

fn job(guid: &str) -> Value {
    json!({
        "guid": guid,
        "title": format!("Job {guid}"),
        "mainCategory": "Engineering",
        "companyName": "Acme",
        "jobType": "Full-time",
        "workModel": "Remote",
        "seniorityLevel": "Senior",
        "minSalary": null,
        "maxSalary": 5000,
        "currency": "USD",
        "locations": ["Berlin"],
        "tags": ["rust"],
        "description": "<p>Build things</p>",
        "pubDate": 1_700_000_000,
        "expiryDate": 1_710_000_000,
        "applicationLink": "https://example.com/apply"
    })
}

/// Serves the three-job catalogue two at a time.
async fn paged_jobs(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let all = ["a", "b", "c"];
    let jobs: Vec<Value> = all.iter().skip(offset).take(2).map(|g| job(g)).collect();
    axum::Json(json!({
        "jobs": jobs,
        "offset": offset,
        "limit": 2,
        "total_count": all.len(),
    }))
}

async fn start_mock_server(app: Router) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (base_url, shutdown_tx)
}

fn source(base_url: &str) -> HttpJobSource {
    HttpJobSource::new(format!("{base_url}/api/v1"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn given_paged_api_when_fetching_then_offset_and_limit_are_sent() {
    let app = Router::new().route(
        "/api/v1",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            axum::Json(json!({
                "jobs": [job("echo")],
                "offset": params.get("offset").and_then(|v| v.parse::<u64>().ok()),
                "limit": params.get("limit").and_then(|v| v.parse::<u64>().ok()),
            }))
        }),
    );
    let (base_url, shutdown_tx) = start_mock_server(app).await;

    let page = source(&base_url).fetch_page(40, 20).await.unwrap();

    assert_eq!(page.offset, Some(40));
    assert_eq!(page.limit, Some(20));
    assert_eq!(page.total_count, None);
    assert_eq!(page.jobs[0].guid, "echo");
    assert_eq!(page.jobs[0].locations, vec!["Berlin"]);
    assert_eq!(page.jobs[0].max_salary, Some(5000.0));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_server_error_when_fetching_then_returns_status_error() {
    let app = Router::new().route(
        "/api/v1",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let (base_url, shutdown_tx) = start_mock_server(app).await;

    let result = source(&base_url).fetch_page(0, 100).await;

    assert!(matches!(result, Err(FetchError::Status(500))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_non_json_body_when_fetching_then_returns_decode_error() {
    let app = Router::new().route("/api/v1", get(|| async { "<html>maintenance</html>" }));
    let (base_url, shutdown_tx) = start_mock_server(app).await;

    let result = source(&base_url).fetch_page(0, 100).await;

    assert!(matches!(result, Err(FetchError::Decode(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_missing_jobs_field_when_fetching_then_returns_empty_page() {
    let app = Router::new().route(
        "/api/v1",
        get(|| async { axum::Json(json!({ "message": "nothing here" })) }),
    );
    let (base_url, shutdown_tx) = start_mock_server(app).await;

    let page = source(&base_url).fetch_page(0, 100).await.unwrap();

    assert!(page.jobs.is_empty());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unreachable_host_when_fetching_then_returns_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = source(&format!("http://{addr}")).fetch_page(0, 100).await;

    assert!(matches!(result, Err(FetchError::Transport(_))));
}

#[tokio::test]
async fn given_three_jobs_in_pages_of_two_when_paging_then_collection_is_complete() {
    let app = Router::new().route("/api/v1", get(paged_jobs));
    let (base_url, shutdown_tx) = start_mock_server(app).await;
    let collection = JobCollection::new(Arc::new(source(&base_url)), 2);

    collection.refetch().await;
    let state = collection.snapshot();
    let guids: Vec<_> = state.jobs.iter().map(|j| j.guid().to_string()).collect();
    assert_eq!(guids, vec!["a", "b"]);
    assert!(state.has_more);
    assert_eq!(state.next_offset, 2);
    let first_id = state.jobs[0].id.clone();

    assert!(collection.load_more().await);
    let state = collection.snapshot();
    let guids: Vec<_> = state.jobs.iter().map(|j| j.guid().to_string()).collect();
    assert_eq!(guids, vec!["a", "b", "c"]);
    assert!(!state.has_more);
    assert_eq!(state.error, None);
    assert_eq!(state.jobs[0].id, first_id);

    assert!(!collection.load_more().await);
    shutdown_tx.send(()).ok();
}
