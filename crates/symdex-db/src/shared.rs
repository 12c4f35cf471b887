//! Lazily opened, process-owned handle to the index store.
//!
//! The host builds one [`SharedIndex`] at startup and passes it to whatever
//! needs the index. The store itself is opened on first use under a mutex,
//! and [`SharedIndex::shutdown`] is the hook the host runs when it exits.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::pool::DbConnection;
use crate::preferences::IndexPreferences;
use crate::store::IndexStore;

/// Owner of the lazily opened [`IndexStore`].
#[derive(Debug)]
pub struct SharedIndex {
    state_dir: PathBuf,
    prefs: IndexPreferences,
    slot: Mutex<Option<Arc<IndexStore>>>,
}

impl SharedIndex {
    /// Prepares a handle for the store under `state_dir`. Does no I/O.
    pub fn new(state_dir: impl Into<PathBuf>, prefs: IndexPreferences) -> Self {
        Self {
            state_dir: state_dir.into(),
            prefs,
            slot: Mutex::new(None),
        }
    }

    /// Directory holding the database files.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Returns the open store, opening it first if needed.
    ///
    /// Open failures are logged and yield `None`; the next call tries again.
    pub fn get(&self) -> Option<Arc<IndexStore>> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(store) = slot.as_ref() {
            return Some(Arc::clone(store));
        }

        match IndexStore::open(&self.state_dir, &self.prefs) {
            Ok(store) => {
                let store = Arc::new(store);
                *slot = Some(Arc::clone(&store));
                Some(store)
            }
            Err(e) => {
                tracing::error!(
                    state_dir = %self.state_dir.display(),
                    error = %e,
                    "failed to open index store"
                );
                None
            }
        }
    }

    /// Checks out a connection from the store, opening it if needed.
    ///
    /// Returns `None` when the store is unavailable or the checkout fails.
    pub fn connection(&self) -> Option<DbConnection> {
        let store = self.get()?;
        match store.connection() {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::error!(error = %e, "failed to check out index connection");
                None
            }
        }
    }

    /// Whether a store is currently open.
    pub fn is_open(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Disposes the open store, if any, and empties the slot.
    pub fn shutdown(&self) {
        let store = self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(store) = store {
            store.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_the_same_store() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let shared = SharedIndex::new(dir.path(), IndexPreferences::default());
        assert!(!shared.is_open());

        let first = shared.get().expect("store should open");
        let second = shared.get().expect("store should still be open");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(shared.is_open());
    }

    #[test]
    fn concurrent_callers_share_one_open() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let shared = Arc::new(SharedIndex::new(dir.path(), IndexPreferences::default()));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    shared.get().expect("store should open")
                })
            })
            .collect();

        let stores: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("caller thread should not panic"))
            .collect();

        for store in &stores[1..] {
            assert!(Arc::ptr_eq(&stores[0], store), "every caller gets the same store");
        }
        assert_eq!(stores[0].open_report().attempts, 1);
    }

    #[test]
    fn zero_connection_timeout_does_not_panic() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let prefs = IndexPreferences {
            connection_timeout_ms: 0,
            ..IndexPreferences::default()
        };
        let shared = SharedIndex::new(dir.path(), prefs);

        assert!(shared.get().is_some());
        assert!(shared.connection().is_some());
    }

    #[test]
    fn shutdown_disposes_and_clears() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let shared = SharedIndex::new(dir.path(), IndexPreferences::default());

        let store = shared.get().expect("store should open");
        shared.shutdown();

        assert!(!shared.is_open());
        assert!(store.is_disposed());

        shared.shutdown();
        assert!(!shared.is_open(), "second shutdown is a no-op");
    }

    #[test]
    fn open_failure_is_swallowed() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").expect("should write blocker file");

        let shared = SharedIndex::new(blocker.join("state"), IndexPreferences::default());

        assert!(shared.get().is_none());
        assert!(shared.connection().is_none());
        assert!(!shared.is_open());
    }
}
