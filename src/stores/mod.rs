// Locally persisted collections: saved jobs, applications and the theme.

pub mod theme;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};

use crate::models::{Application, SavedJob};
use crate::storage::KeyValueStorage;

pub use theme::ThemeStore;

/// An entry kept in a [`PersistedStore`], identified by its job guid.
pub trait StoredEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Storage key the whole collection is written under.
    const STORAGE_KEY: &'static str;

    fn guid(&self) -> &str;
}

impl StoredEntry for SavedJob {
    const STORAGE_KEY: &'static str = "saved-jobs";

    fn guid(&self) -> &str {
        self.job.guid()
    }
}

impl StoredEntry for Application {
    const STORAGE_KEY: &'static str = "applied-jobs";

    fn guid(&self) -> &str {
        &self.id
    }
}

pub type SavedJobsStore = PersistedStore<SavedJob>;
pub type ApplicationsStore = PersistedStore<Application>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreState<T> {
    /// Most recent first, at most one entry per guid.
    pub entries: Vec<T>,
    pub hydrated: bool,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            hydrated: false,
        }
    }
}

/// A guid-keyed list persisted as one JSON array.
///
/// Nothing is written until [`hydrate`](Self::hydrate) has finished, so an
/// empty in-memory list never replaces data from a previous session.
/// Storage failures are logged and otherwise ignored.
pub struct PersistedStore<T: StoredEntry> {
    storage: Arc<dyn KeyValueStorage>,
    state: watch::Sender<StoreState<T>>,
    // Held across the storage write so values land in mutation order.
    write_lock: Mutex<()>,
}

impl<T: StoredEntry> PersistedStore<T> {
    /// Create an unhydrated store.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            storage,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store and load its persisted entries.
    pub async fn open(storage: Arc<dyn KeyValueStorage>) -> Self {
        let store = Self::new(storage);
        store.hydrate().await;
        store
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<T>> {
        self.state.subscribe()
    }

    pub fn hydrated(&self) -> bool {
        self.state.borrow().hydrated
    }

    pub fn entries(&self) -> Vec<T> {
        self.state.borrow().entries.clone()
    }

    pub fn get(&self, guid: &str) -> Option<T> {
        self.state
            .borrow()
            .entries
            .iter()
            .find(|e| e.guid() == guid)
            .cloned()
    }

    pub fn is_present(&self, guid: &str) -> bool {
        self.state.borrow().entries.iter().any(|e| e.guid() == guid)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load persisted entries. Entries added before hydration stay in front.
    pub async fn hydrate(&self) {
        let _guard = self.write_lock.lock().await;
        if self.hydrated() {
            return;
        }

        let loaded = self.load().await;
        let mut had_pending = false;
        self.state.send_modify(|s| {
            had_pending = !s.entries.is_empty();
            let known: HashSet<String> = s.entries.iter().map(|e| e.guid().to_string()).collect();
            s.entries
                .extend(loaded.into_iter().filter(|e| !known.contains(e.guid())));
            s.hydrated = true;
        });
        tracing::debug!("Hydrated '{}' with {} entries", T::STORAGE_KEY, self.len());

        if had_pending {
            self.persist().await;
        }
    }

    /// Insert or replace by guid. New entries go to the front.
    pub async fn add(&self, entry: T) {
        self.mutate(|entries| {
            match entries.iter().position(|e| e.guid() == entry.guid()) {
                Some(i) => entries[i] = entry,
                None => entries.insert(0, entry),
            }
            true
        })
        .await;
    }

    /// Remove the entry for `guid`. Returns whether one was present.
    pub async fn remove(&self, guid: &str) -> bool {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.guid() != guid);
            entries.len() != before
        })
        .await
    }

    pub async fn clear(&self) {
        self.mutate(|entries| {
            let changed = !entries.is_empty();
            entries.clear();
            changed
        })
        .await;
    }

    async fn mutate(&self, f: impl FnOnce(&mut Vec<T>) -> bool) -> bool {
        let _guard = self.write_lock.lock().await;
        let changed = self.state.send_if_modified(|s| f(&mut s.entries));
        if changed {
            self.persist().await;
        }
        changed
    }

    async fn load(&self) -> Vec<T> {
        let raw = match self.storage.get(T::STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read '{}': {e}", T::STORAGE_KEY);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring malformed '{}' data: {e}", T::STORAGE_KEY);
                Vec::new()
            }
        }
    }

    /// Write the current entries. Callers hold `write_lock`.
    async fn persist(&self) {
        let json = {
            let state = self.state.borrow();
            if !state.hydrated {
                return;
            }
            serde_json::to_string(&state.entries)
        };

        let json = match json {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode '{}': {e}", T::STORAGE_KEY);
                return;
            }
        };
        if let Err(e) = self.storage.set(T::STORAGE_KEY, &json).await {
            tracing::warn!("Failed to persist '{}': {e}", T::STORAGE_KEY);
        }
    }
}
