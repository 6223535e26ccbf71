//! Active configuration store.
//!
//! # Data Flow
//! ```text
//! update(RawDocument)
//!     → decode_document (no lock held)
//!     → write lock, swap Arc<CanonicalConfig>, release
//!     → ReloadNotifier::notify (drop if a signal is pending)
//!
//! get()      → read lock, deep clone
//! snapshot() → read lock, Arc clone
//! ```
//!
//! # Design Decisions
//! - The active value is replaced whole, never mutated in place
//! - Decode and validation run on a private candidate before any lock is taken
//! - A poisoned lock is recovered; the guarded value is always a complete config

mod reload;

pub use reload::{ReloadNotifier, ReloadReceiver};

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::config::errors::ErrorList;
use crate::config::loader::decode_document;
use crate::config::schema::CanonicalConfig;
use crate::decode::parser::RawDocument;
use crate::observability::metrics;

/// Holds exactly one active configuration.
#[derive(Debug)]
pub struct ConfigStore {
    active: RwLock<Arc<CanonicalConfig>>,
    reload: ReloadNotifier,
}

impl ConfigStore {
    pub fn new(initial: CanonicalConfig) -> Self {
        Self {
            active: RwLock::new(Arc::new(initial)),
            reload: ReloadNotifier::new(),
        }
    }

    /// A store holding the empty default configuration.
    pub fn empty() -> Self {
        Self::new(CanonicalConfig::default())
    }

    fn read(&self) -> RwLockReadGuard<'_, Arc<CanonicalConfig>> {
        self.active.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<CanonicalConfig>> {
        self.active.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// An independent deep copy of the active configuration.
    pub fn get(&self) -> CanonicalConfig {
        CanonicalConfig::clone(&self.snapshot())
    }

    /// A shared handle to the active configuration, for read-only hot paths.
    pub fn snapshot(&self) -> Arc<CanonicalConfig> {
        Arc::clone(&self.read())
    }

    /// Decode, validate and, only on full success, activate a candidate document.
    ///
    /// On failure the active configuration is untouched and every problem is returned.
    pub fn update(&self, document: &RawDocument) -> Result<CanonicalConfig, ErrorList> {
        let start = Instant::now();

        let candidate = match decode_document(document) {
            Ok(candidate) => candidate,
            Err(errors) => {
                metrics::record_config_update("rejected", start);
                tracing::warn!(
                    format = %document.format,
                    problems = errors.len(),
                    error = %errors,
                    "Configuration update rejected"
                );
                return Err(errors);
            }
        };

        for dangling in candidate.dangling_references() {
            tracing::warn!(reference = %dangling, "Configuration has a dangling reference");
        }

        let accepted = candidate.clone();
        let previous = std::mem::replace(&mut *self.write(), Arc::new(candidate));
        // Freed outside the lock.
        drop(previous);
        self.reload.notify();

        metrics::record_config_update("accepted", start);
        tracing::info!(
            listeners = accepted.listeners.len(),
            endpoints = accepted.endpoints.len(),
            apps = accepted.apps.len(),
            "Configuration updated"
        );
        Ok(accepted)
    }

    /// Take the reload receiver. Only the first caller gets it.
    pub fn subscribe(&self) -> Option<ReloadReceiver> {
        self.reload.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::errors::ErrorKind;

    const VALID: &str = r#"
        [[listeners]]
        id = "public"
        address = ":8080"
        type = "http"

        [[endpoints]]
        id = "main"
        listener_ids = ["public"]

        [[endpoints.routes]]
        app_id = "echo"
        http = { path_prefix = "/" }

        [[apps]]
        id = "echo"
        type = "echo"
    "#;

    #[test]
    fn test_update_then_get() {
        let store = ConfigStore::empty();
        let accepted = store.update(&RawDocument::toml(VALID)).unwrap();

        assert_eq!(store.get(), accepted);
        assert_eq!(store.get().apps[0].id, "echo");
    }

    #[test]
    fn test_failed_update_leaves_state_untouched() {
        let store = ConfigStore::empty();
        store.update(&RawDocument::toml(VALID)).unwrap();
        let before = store.get();

        let errors = store
            .update(&RawDocument::toml("version = \"v2\""))
            .unwrap_err();
        assert!(errors.has(ErrorKind::UnsupportedVersion));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_get_is_independent_copy() {
        let store = ConfigStore::empty();
        store.update(&RawDocument::toml(VALID)).unwrap();

        let mut copy = store.get();
        copy.apps.clear();
        assert_eq!(store.get().apps.len(), 1);
    }

    #[test]
    fn test_snapshot_outlives_replacement() {
        let store = ConfigStore::empty();
        let before = store.snapshot();

        store.update(&RawDocument::toml(VALID)).unwrap();

        assert!(before.apps.is_empty());
        assert_eq!(store.snapshot().apps.len(), 1);
        assert!(!Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_many_updates_leave_one_pending_signal() {
        let store = ConfigStore::empty();
        let mut receiver = store.subscribe().unwrap();

        for _ in 0..5 {
            store.update(&RawDocument::toml(VALID)).unwrap();
        }

        assert!(receiver.try_pending());
        assert!(!receiver.try_pending());
    }

    #[test]
    fn test_rejected_update_sends_no_signal() {
        let store = ConfigStore::empty();
        let mut receiver = store.subscribe().unwrap();

        let _ = store.update(&RawDocument::toml("[[listeners]]\nid = \"x\""));
        assert!(!receiver.try_pending());
    }
}
