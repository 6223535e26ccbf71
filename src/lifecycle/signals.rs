//! OS signal handling.
//!
//! SIGTERM and SIGINT stop the process. SIGHUP re-reads the config file,
//! when one was given, through the same path as the file watcher.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::watcher::reload_from_file;
use crate::lifecycle::Shutdown;
use crate::store::ConfigStore;

/// Spawn the signal listener. It exits after triggering shutdown.
pub fn spawn_signal_handler(
    shutdown: Arc<Shutdown>,
    store: Arc<ConfigStore>,
    config_path: Option<PathBuf>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        listen(shutdown, store, config_path).await;
    })
}

#[cfg(unix)]
async fn listen(shutdown: Arc<Shutdown>, store: Arc<ConfigStore>, config_path: Option<PathBuf>) {
    use tokio::signal::unix::{signal, SignalKind};

    let handlers = (signal(SignalKind::terminate()), signal(SignalKind::hangup()));
    let (mut term, mut hup) = match handlers {
        (Ok(term), Ok(hup)) => (term, hup),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(
                error = %e,
                "Failed to register signal handlers, falling back to Ctrl+C"
            );
            let _ = tokio::signal::ctrl_c().await;
            shutdown.trigger();
            return;
        }
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            _ = term.recv() => {
                tracing::info!("SIGTERM received, shutting down");
                break;
            }
            _ = hup.recv() => match &config_path {
                Some(path) => {
                    tracing::info!(path = %path.display(), "SIGHUP received, reloading config");
                    let store = Arc::clone(&store);
                    let path = path.clone();
                    let reload = move || reload_from_file(&store, &path);
                    if let Err(e) = tokio::task::spawn_blocking(reload).await {
                        tracing::error!(error = %e, "Reload task failed");
                    }
                }
                None => tracing::warn!("SIGHUP received but no config file was given, ignoring"),
            },
        }
    }

    shutdown.trigger();
}

#[cfg(not(unix))]
async fn listen(shutdown: Arc<Shutdown>, _store: Arc<ConfigStore>, _config_path: Option<PathBuf>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Ctrl+C received, shutting down");
    shutdown.trigger();
}
