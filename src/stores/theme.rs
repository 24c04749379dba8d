use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::models::ThemeMode;
use crate::storage::KeyValueStorage;

const STORAGE_KEY: &str = "theme-mode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub hydrated: bool,
}

/// Persisted light/dark preference.
pub struct ThemeStore {
    storage: Arc<dyn KeyValueStorage>,
    state: watch::Sender<ThemeState>,
    write_lock: Mutex<()>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (state, _) = watch::channel(ThemeState::default());
        Self {
            storage,
            state,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn open(storage: Arc<dyn KeyValueStorage>) -> Self {
        let store = Self::new(storage);
        store.hydrate().await;
        store
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ThemeState {
        *self.state.borrow()
    }

    pub fn mode(&self) -> ThemeMode {
        self.state.borrow().mode
    }

    pub fn is_dark(&self) -> bool {
        self.mode() == ThemeMode::Dark
    }

    /// Load the stored mode. Absent or unknown values leave the default.
    pub async fn hydrate(&self) {
        let _guard = self.write_lock.lock().await;
        if self.state.borrow().hydrated {
            return;
        }

        let stored = match self.storage.get(STORAGE_KEY).await {
            Ok(value) => value.and_then(|v| v.parse::<ThemeMode>().ok()),
            Err(e) => {
                tracing::warn!("Failed to read '{STORAGE_KEY}': {e}");
                None
            }
        };

        self.state.send_modify(|s| {
            if let Some(mode) = stored {
                s.mode = mode;
            }
            s.hydrated = true;
        });
        self.persist().await;
    }

    pub async fn set(&self, mode: ThemeMode) {
        self.update(|_| mode).await;
    }

    /// Flip between light and dark, returning the new mode.
    pub async fn toggle(&self) -> ThemeMode {
        self.update(ThemeMode::toggled).await
    }

    async fn update(&self, f: impl FnOnce(ThemeMode) -> ThemeMode) -> ThemeMode {
        let _guard = self.write_lock.lock().await;
        let mut next = ThemeMode::default();
        let changed = self.state.send_if_modified(|s| {
            next = f(s.mode);
            if s.mode == next {
                return false;
            }
            s.mode = next;
            true
        });
        if changed {
            tracing::info!("Theme switched to {next}");
            self.persist().await;
        }
        next
    }

    async fn persist(&self) {
        let ThemeState { mode, hydrated } = self.state();
        if !hydrated {
            return;
        }
        if let Err(e) = self.storage.set(STORAGE_KEY, mode.as_str()).await {
            tracing::warn!("Failed to persist '{STORAGE_KEY}': {e}");
        }
    }
}
