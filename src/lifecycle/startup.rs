//! Startup orchestration.
//!
//! Subsystems come up in dependency order: store, metrics, route registry,
//! watcher, signals and finally the control API listener.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminOptions};
use crate::config::errors::{ConfigError, ErrorList};
use crate::config::loader::decode_document;
use crate::config::schema::{CanonicalConfig, LoggingOptions};
use crate::config::watcher::ConfigWatcher;
use crate::decode::parser::RawDocument;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::init_metrics;
use crate::routing::RouteRegistry;
use crate::service::ConfigService;
use crate::store::ConfigStore;

#[derive(Debug, Clone)]
pub struct StartupOptions {
    /// Config file used for the initial load, SIGHUP and `watch`.
    pub config_path: Option<PathBuf>,
    pub watch: bool,
    pub listen: SocketAddr,
    pub metrics_address: Option<SocketAddr>,
    pub admin: AdminOptions,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind control API on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("control API server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// The `[logging]` table of the initial document.
///
/// Runs before a subscriber is installed, so its decode events are not kept;
/// [`decode_initial`] decodes the document again once logging is up.
pub fn initial_logging(document: &RawDocument) -> LoggingOptions {
    decode_document(document)
        .ok()
        .and_then(|config| config.logging)
        .unwrap_or_default()
}

/// Decode the initial document with logging in place.
pub fn decode_initial(
    document: Result<RawDocument, ConfigError>,
) -> Result<CanonicalConfig, ErrorList> {
    decode_document(&document?)
}

/// Build the store from the outcome of the initial load.
///
/// A rejected or missing initial config leaves the store empty; later
/// updates can still bring it up.
pub fn initial_store(initial: Option<Result<CanonicalConfig, ErrorList>>) -> ConfigStore {
    match initial {
        Some(Ok(config)) => {
            for dangling in config.dangling_references() {
                tracing::warn!(reference = %dangling, "Configuration has a dangling reference");
            }
            tracing::info!(
                listeners = config.listeners.len(),
                endpoints = config.endpoints.len(),
                apps = config.apps.len(),
                "Initial configuration loaded"
            );
            ConfigStore::new(config)
        }
        Some(Err(errors)) => {
            for message in errors.messages() {
                tracing::error!(problem = %message, "Initial configuration problem");
            }
            tracing::error!("Initial configuration rejected, starting with an empty configuration");
            ConfigStore::empty()
        }
        None => {
            tracing::info!("No config file given, starting with an empty configuration");
            ConfigStore::empty()
        }
    }
}

/// Run the daemon until a shutdown signal arrives.
pub async fn run(
    options: StartupOptions,
    initial: Option<Result<CanonicalConfig, ErrorList>>,
) -> Result<(), StartupError> {
    let store = Arc::new(initial_store(initial));
    let shutdown = Arc::new(Shutdown::new());

    if let Some(addr) = options.metrics_address {
        match init_metrics(addr) {
            Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
            Err(e) => {
                tracing::error!(error = %e, address = %addr, "Failed to start metrics exporter")
            }
        }
    }

    let registry = Arc::new(RouteRegistry::new(Arc::clone(&store)));
    let registry_task = store.subscribe().map(|reload| {
        tokio::spawn(Arc::clone(&registry).run(reload, shutdown.subscribe()))
    });

    // Dropping the watcher stops it, so it lives until run returns.
    let _watcher = match (&options.config_path, options.watch) {
        (Some(path), true) => match ConfigWatcher::new(path, Arc::clone(&store)).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to watch config file");
                None
            }
        },
        (None, true) => {
            tracing::warn!("--watch given without --config, nothing to watch");
            None
        }
        _ => None,
    };

    spawn_signal_handler(
        Arc::clone(&shutdown),
        Arc::clone(&store),
        options.config_path.clone(),
    );

    let listener = TcpListener::bind(options.listen)
        .await
        .map_err(|source| StartupError::Bind {
            addr: options.listen,
            source,
        })?;
    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
    tracing::info!(address = %local_addr, "Control API listening");

    let app = setup_admin_router(ConfigService::new(Arc::clone(&store)), options.admin);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await
        .map_err(StartupError::Serve)?;

    // The server can also stop on its own; make sure background tasks follow.
    shutdown.trigger();
    if let Some(task) = registry_task {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    use crate::config::schema::{LogFormat, LogLevel};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    const SHADOWED_ROUTE: &str = r#"
        [logging]
        format = "json"
        level = "warn"

        [[listeners]]
        id = "public"
        address = ":8080"
        type = "http"

        [[endpoints]]
        id = "main"
        listener_ids = ["public"]

        [endpoints.route]
        app_id = "echo"
        http_path = "/old"

        [[endpoints.routes]]
        app_id = "echo"
        http = { path_prefix = "/" }

        [[apps]]
        id = "echo"
        type = "echo"
    "#;

    #[test]
    fn test_initial_logging_reads_logging_table() {
        let logging = initial_logging(&RawDocument::toml(SHADOWED_ROUTE));
        assert_eq!(logging.format, Some(LogFormat::Json));
        assert_eq!(logging.level, Some(LogLevel::Warn));

        let rejected = initial_logging(&RawDocument::toml("version = \"v2\""));
        assert_eq!(rejected, LoggingOptions::default());
    }

    #[test]
    fn test_decode_initial_emits_decode_warnings() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || {
            decode_initial(Ok(RawDocument::toml(SHADOWED_ROUTE)))
        })
        .unwrap();

        assert_eq!(config.endpoints[0].routes.len(), 1);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Ignoring singular 'route'"));
    }

    #[test]
    fn test_decode_initial_reports_read_failure() {
        let errors = decode_initial(Err(ConfigError::EmptyDocument)).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_initial_store_keeps_accepted_config() {
        let config = crate::config::decode_document(&RawDocument::toml(
            "[[apps]]\nid = \"echo\"\ntype = \"echo\"\n",
        ))
        .unwrap();

        let store = initial_store(Some(Ok(config.clone())));
        assert_eq!(store.get(), config);
    }

    #[test]
    fn test_initial_store_starts_empty_on_rejection() {
        let errors = crate::config::decode_document(&RawDocument::toml("version = \"v9\""))
            .unwrap_err();

        let store = initial_store(Some(Err(errors)));
        assert_eq!(store.get(), CanonicalConfig::default());
        assert_eq!(initial_store(None).get(), CanonicalConfig::default());
    }
}
