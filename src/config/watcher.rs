//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::read_document;
use crate::store::ConfigStore;

/// Pushes every change of a config file through [`ConfigStore::update`].
pub struct ConfigWatcher {
    path: PathBuf,
    store: Arc<ConfigStore>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, store: Arc<ConfigStore>) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
        }
    }

    /// Start watching the file on notify's background thread.
    ///
    /// Watching stops when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let store = self.store;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(
                            path = %path.display(),
                            "Config file change detected, reloading..."
                        );
                        reload_from_file(&store, &path);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Read a config file and apply it. Failures are logged and leave the store untouched.
pub fn reload_from_file(store: &ConfigStore, path: &Path) -> bool {
    let document = match read_document(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to read config file. Keeping current configuration."
            );
            return false;
        }
    };

    match store.update(&document) {
        Ok(_) => true,
        Err(errors) => {
            tracing::error!(
                error = %errors,
                "Failed to reload config. Keeping current configuration."
            );
            false
        }
    }
}
