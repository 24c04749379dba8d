use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::models::job::{Job, JobPage, JobRecord};
use crate::sources::JobSource;

/// Observable state of the canonical job list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCollectionState {
    /// Jobs in API arrival order, at most one per guid.
    pub jobs: Vec<Job>,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    pub total_count: u64,
    pub has_more: bool,
    pub next_offset: u64,
    // Bumped by every refetch; a page loaded for an older generation is dropped.
    #[serde(skip)]
    generation: u64,
}

impl Default for JobCollectionState {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            loading: false,
            loading_more: false,
            error: None,
            total_count: 0,
            has_more: true,
            next_offset: 0,
            generation: 0,
        }
    }
}

impl JobCollectionState {
    pub fn find(&self, guid: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.guid() == guid)
    }
}

/// Owns the canonical job list and keeps it in sync with a [`JobSource`].
///
/// Every state transition is published on a watch channel; see
/// [`JobCollection::subscribe`].
pub struct JobCollection {
    source: Arc<dyn JobSource>,
    page_size: u64,
    state: watch::Sender<JobCollectionState>,
}

impl JobCollection {
    pub fn new(source: Arc<dyn JobSource>, page_size: u64) -> Self {
        let (state, _) = watch::channel(JobCollectionState::default());
        Self {
            source,
            page_size,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobCollectionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> JobCollectionState {
        self.state.borrow().clone()
    }

    /// Clone of the job with this guid, if loaded.
    pub fn find(&self, guid: &str) -> Option<Job> {
        self.state.borrow().find(guid).cloned()
    }

    /// Replace the collection with the first page.
    ///
    /// On failure the collection is emptied rather than left stale.
    pub async fn refetch(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.generation += 1;
        });

        let result = self.source.fetch_page(0, self.page_size).await;

        self.state.send_modify(|s| {
            match result {
                Ok(page) => {
                    let page_len = page.jobs.len();
                    let JobPage {
                        jobs,
                        limit,
                        total_count,
                        ..
                    } = page;

                    s.jobs = merge_jobs(Vec::new(), jobs);
                    s.total_count = total_count.unwrap_or(page_len as u64);
                    s.next_offset = limit.unwrap_or(self.page_size);
                    s.has_more = compute_has_more(page_len, s.jobs.len(), s.total_count);
                    tracing::info!(
                        "Loaded {} jobs from {} (total {})",
                        s.jobs.len(),
                        self.source.name(),
                        s.total_count
                    );
                }
                Err(e) => {
                    tracing::warn!("Refetch from {} failed: {e}", self.source.name());
                    s.error = Some(e.to_string());
                    s.jobs.clear();
                    s.total_count = 0;
                    s.next_offset = 0;
                    s.has_more = false;
                }
            }
            s.loading = false;
        });
    }

    /// Fetch the next page and merge it in.
    ///
    /// Returns `false` without requesting anything when a load is already
    /// in flight or there is nothing more to fetch. On failure the loaded
    /// jobs are kept. A page that arrives after a refetch started is ignored.
    pub async fn load_more(&self) -> bool {
        let mut offset = 0;
        let mut generation = 0;
        let started = self.state.send_if_modified(|s| {
            if s.loading || s.loading_more || !s.has_more {
                return false;
            }
            s.loading_more = true;
            offset = s.next_offset;
            generation = s.generation;
            true
        });
        if !started {
            tracing::debug!("Skipping load_more: busy or no more pages");
            return false;
        }

        let result = self.source.fetch_page(offset, self.page_size).await;

        self.state.send_modify(|s| {
            if s.generation != generation {
                tracing::debug!("Discarding page at offset {offset}: collection was refetched");
                s.loading_more = false;
                return;
            }
            match result {
                Ok(page) => {
                    let page_len = page.jobs.len();
                    let JobPage {
                        jobs,
                        limit,
                        total_count,
                        ..
                    } = page;

                    let existing = std::mem::take(&mut s.jobs);
                    s.jobs = merge_jobs(existing, jobs);
                    s.total_count = total_count.unwrap_or(s.total_count);
                    s.has_more = compute_has_more(page_len, s.jobs.len(), s.total_count);
                    s.next_offset += limit.unwrap_or(self.page_size);
                    tracing::info!(
                        "Loaded {page_len} more jobs at offset {offset} ({} of {})",
                        s.jobs.len(),
                        s.total_count
                    );
                }
                Err(e) => {
                    tracing::warn!("Loading more jobs at offset {offset} failed: {e}");
                    s.error = Some(e.to_string());
                }
            }
            s.loading_more = false;
        });
        true
    }
}

fn compute_has_more(page_len: usize, collection_len: usize, total_count: u64) -> bool {
    page_len > 0 && (collection_len as u64) < total_count
}

/// Merge incoming records into `existing` by guid.
///
/// Incoming data wins on every field except the local id, which is kept
/// for known guids and generated for new ones. Known guids keep their
/// position; new guids are appended in arrival order.
pub fn merge_jobs(mut existing: Vec<Job>, incoming: Vec<JobRecord>) -> Vec<Job> {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, job)| (job.guid().to_string(), i))
        .collect();

    for record in incoming {
        match index.get(&record.guid) {
            Some(&i) => {
                let id = std::mem::take(&mut existing[i].id);
                existing[i] = Job::with_id(record, id);
            }
            None => {
                index.insert(record.guid.clone(), existing.len());
                existing.push(Job::new(record));
            }
        }
    }

    existing
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::FetchError;

    /// Replays canned responses and records requested offsets.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<JobPage, FetchError>>>,
        offsets: Mutex<Vec<u64>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<JobPage, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                offsets: Mutex::new(Vec::new()),
            })
        }

        fn offsets(&self) -> Vec<u64> {
            self.offsets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_page(&self, offset: u64, _limit: u64) -> Result<JobPage, FetchError> {
            self.offsets.lock().unwrap().push(offset);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(JobPage::default()))
        }
    }

    fn record(guid: &str, title: &str) -> JobRecord {
        JobRecord {
            guid: guid.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn page(guids: &[&str], limit: u64, total: u64) -> JobPage {
        JobPage {
            jobs: guids.iter().map(|g| record(g, g)).collect(),
            offset: None,
            limit: Some(limit),
            total_count: Some(total),
        }
    }

    fn numbered_page(range: std::ops::Range<u32>, limit: u64, total: u64) -> JobPage {
        JobPage {
            jobs: range.map(|i| record(&format!("job-{i}"), "x")).collect(),
            offset: None,
            limit: Some(limit),
            total_count: Some(total),
        }
    }

    fn guids(state: &JobCollectionState) -> Vec<&str> {
        state.jobs.iter().map(|j| j.guid()).collect()
    }

    #[tokio::test]
    async fn refetch_then_load_more_merges_pages() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b"], 2, 3)),
            Ok(page(&["c"], 2, 3)),
        ]);
        let collection = JobCollection::new(source.clone(), 2);

        collection.refetch().await;
        let state = collection.snapshot();
        assert_eq!(guids(&state), vec!["a", "b"]);
        assert!(state.has_more);
        assert_eq!(state.next_offset, 2);
        assert!(!state.loading);

        assert!(collection.load_more().await);
        let state = collection.snapshot();
        assert_eq!(guids(&state), vec!["a", "b", "c"]);
        assert!(!state.has_more);
        assert_eq!(source.offsets(), vec![0, 2]);
    }

    #[tokio::test]
    async fn has_more_tracks_total_count_across_pages() {
        let source = ScriptedSource::new(vec![
            Ok(numbered_page(0..100, 100, 250)),
            Ok(numbered_page(100..200, 100, 250)),
            Ok(numbered_page(200..250, 100, 250)),
        ]);
        let collection = JobCollection::new(source.clone(), 100);

        collection.refetch().await;
        assert!(collection.snapshot().has_more);

        collection.load_more().await;
        assert!(collection.snapshot().has_more);

        collection.load_more().await;
        let state = collection.snapshot();
        assert_eq!(state.jobs.len(), 250);
        assert!(!state.has_more);
        assert_eq!(state.next_offset, 300);

        // Exhausted: no further request is issued.
        assert!(!collection.load_more().await);
        assert_eq!(source.offsets(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn local_ids_survive_refreshed_records() {
        let mut updated = record("b", "Senior B");
        updated.max_salary = Some(7000.0);
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b"], 2, 10)),
            Ok(JobPage {
                jobs: vec![updated, record("c", "c")],
                offset: None,
                limit: Some(2),
                total_count: Some(10),
            }),
        ]);
        let collection = JobCollection::new(source, 2);

        collection.refetch().await;
        let before = collection.find("b").unwrap();

        collection.load_more().await;
        let after = collection.find("b").unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.title, "Senior B");
        assert_eq!(after.max_salary, Some(7000.0));

        let state = collection.snapshot();
        assert_eq!(guids(&state), vec!["a", "b", "c"]);
        let unique: HashSet<_> = state.jobs.iter().map(|j| j.guid()).collect();
        assert_eq!(unique.len(), state.jobs.len());
    }

    #[tokio::test]
    async fn duplicate_guids_within_a_page_collapse() {
        let source = ScriptedSource::new(vec![Ok(JobPage {
            jobs: vec![record("a", "first"), record("b", "b"), record("a", "second")],
            offset: None,
            limit: None,
            total_count: None,
        })]);
        let collection = JobCollection::new(source, 100);

        collection.refetch().await;
        let state = collection.snapshot();
        assert_eq!(guids(&state), vec!["a", "b"]);
        assert_eq!(state.jobs[0].title, "second");
        // Missing metadata falls back to page length and configured page size.
        assert_eq!(state.total_count, 3);
        assert_eq!(state.next_offset, 100);
    }

    #[tokio::test]
    async fn refetch_failure_clears_collection() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b"], 2, 5)),
            Err(FetchError::Status(503)),
        ]);
        let collection = JobCollection::new(source, 2);

        collection.refetch().await;
        collection.refetch().await;

        let state = collection.snapshot();
        assert!(state.jobs.is_empty());
        assert_eq!(state.total_count, 0);
        assert!(!state.has_more);
        assert_eq!(
            state.error.as_deref(),
            Some("Request failed with status code 503")
        );
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn load_more_failure_keeps_loaded_jobs() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b"], 2, 5)),
            Err(FetchError::Transport("connection reset".to_string())),
            Ok(page(&["c", "d"], 2, 5)),
        ]);
        let collection = JobCollection::new(source.clone(), 2);

        collection.refetch().await;
        collection.load_more().await;

        let state = collection.snapshot();
        assert_eq!(guids(&state), vec!["a", "b"]);
        assert_eq!(state.error.as_deref(), Some("Network error: connection reset"));
        assert!(state.has_more);
        assert_eq!(state.next_offset, 2);
        assert!(!state.loading_more);

        // Retrying asks for the same offset again.
        collection.load_more().await;
        assert_eq!(guids(&collection.snapshot()), vec!["a", "b", "c", "d"]);
        assert_eq!(source.offsets(), vec![0, 2, 2]);
    }

    #[tokio::test]
    async fn refetch_clears_previous_error() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::Decode("expected value".to_string())),
            Ok(page(&["a"], 1, 1)),
        ]);
        let collection = JobCollection::new(source, 1);

        collection.refetch().await;
        assert!(collection.snapshot().error.is_some());

        collection.refetch().await;
        let state = collection.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(guids(&state), vec!["a"]);
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn empty_page_stops_pagination() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a"], 1, 10)),
            Ok(page(&[], 1, 10)),
        ]);
        let collection = JobCollection::new(source, 1);

        collection.refetch().await;
        collection.load_more().await;

        let state = collection.snapshot();
        assert!(!state.has_more);
        assert_eq!(state.jobs.len(), 1);
    }

    #[tokio::test]
    async fn load_more_is_skipped_while_in_flight() {
        let source = ScriptedSource::new(vec![Ok(page(&["a"], 1, 10))]);
        let collection = JobCollection::new(source.clone(), 1);

        collection.state.send_modify(|s| s.loading_more = true);
        assert!(!collection.load_more().await);

        collection.state.send_modify(|s| {
            s.loading_more = false;
            s.loading = true;
        });
        assert!(!collection.load_more().await);
        assert!(source.offsets().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_final_state() {
        let source = ScriptedSource::new(vec![Ok(page(&["a", "b"], 2, 2))]);
        let collection = JobCollection::new(source, 2);
        let mut rx = collection.subscribe();

        collection.refetch().await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.jobs.len(), 2);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn refetch_assigns_fresh_local_ids() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b"], 2, 2)),
            Ok(page(&["a", "b"], 2, 2)),
        ]);
        let collection = JobCollection::new(source, 2);

        collection.refetch().await;
        let first: Vec<_> = collection.snapshot().jobs.into_iter().map(|j| j.id).collect();
        collection.refetch().await;
        let second = collection.snapshot();

        assert_eq!(guids(&second), vec!["a", "b"]);
        assert_ne!(second.jobs[0].id, first[0]);
        assert_ne!(second.jobs[1].id, first[1]);
    }

    /// Answers offset 0 immediately and holds later pages until released.
    struct GatedSource {
        gate: tokio::sync::Notify,
        refetches: Mutex<u32>,
    }

    #[async_trait]
    impl JobSource for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch_page(&self, offset: u64, _limit: u64) -> Result<JobPage, FetchError> {
            if offset == 0 {
                let mut n = self.refetches.lock().unwrap();
                *n += 1;
                return Ok(if *n == 1 {
                    page(&["a", "b"], 2, 10)
                } else {
                    page(&["x", "y"], 2, 10)
                });
            }
            self.gate.notified().await;
            Ok(page(&["c", "d"], 2, 10))
        }
    }

    #[tokio::test]
    async fn late_page_after_refetch_is_discarded() {
        let source = Arc::new(GatedSource {
            gate: tokio::sync::Notify::new(),
            refetches: Mutex::new(0),
        });
        let collection = Arc::new(JobCollection::new(source.clone(), 2));
        collection.refetch().await;

        let mut rx = collection.subscribe();
        let pending = tokio::spawn({
            let collection = collection.clone();
            async move { collection.load_more().await }
        });
        rx.wait_for(|s| s.loading_more).await.unwrap();

        collection.refetch().await;
        source.gate.notify_one();
        assert!(pending.await.unwrap());

        let state = collection.snapshot();
        assert_eq!(guids(&state), vec!["x", "y"]);
        assert_eq!(state.next_offset, 2);
        assert!(state.has_more);
        assert!(!state.loading_more);
    }

    #[test]
    fn merge_appends_new_guids_after_existing() {
        let existing = vec![
            Job::with_id(record("a", "a"), "id-a".to_string()),
            Job::with_id(record("b", "b"), "id-b".to_string()),
        ];
        let merged = merge_jobs(existing, vec![record("c", "c"), record("a", "a2")]);

        let ids: Vec<_> = merged.iter().map(|j| (j.guid(), j.title.as_str())).collect();
        assert_eq!(ids, vec![("a", "a2"), ("b", "b"), ("c", "c")]);
        assert_eq!(merged[0].id, "id-a");
        assert!(!merged[2].id.is_empty());
    }
}
