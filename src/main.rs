//! config-plane daemon
//!
//! Holds the active gateway configuration and serves the control API.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file (SIGHUP/watch) ──┐
//!                                ▼
//!   POST /v1/config ──▶ decode pipeline ──▶ ConfigStore ──▶ GET /v1/config
//!                      parse → version      (atomic swap)
//!                      → skeleton → post         │
//!                      process → validate        ▼
//!                                          reload signal ──▶ route registry
//!                                          (single slot)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use config_plane::admin::{AdminOptions, DEFAULT_MAX_BODY_BYTES};
use config_plane::config::loader::read_document;
use config_plane::config::schema::{LogFormat, LogLevel};
use config_plane::lifecycle::{self, StartupOptions};
use config_plane::observability::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "config-plane", version)]
#[command(about = "Configuration control plane for a config-driven gateway", long_about = None)]
struct Args {
    /// Initial config file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control API address
    #[arg(short, long, default_value = "127.0.0.1:8765")]
    listen: SocketAddr,

    /// Bearer token required by /v1/config
    #[arg(long)]
    api_key: Option<String>,

    /// Reload the config file when it changes on disk
    #[arg(short, long)]
    watch: bool,

    /// Prometheus exporter address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Overrides logging.format from the config file (json or txt)
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Overrides logging.level from the config file
    #[arg(long)]
    log_level: Option<LogLevel>,

    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The [logging] table configures tracing; the full decode runs after it.
    let document = args.config.as_deref().map(read_document);
    let logging = match &document {
        Some(Ok(document)) => lifecycle::startup::initial_logging(document),
        _ => Default::default(),
    };

    init_tracing(
        args.log_format.or(logging.format).unwrap_or_default(),
        args.log_level.or(logging.level).unwrap_or_default(),
    )
    .map_err(|e| format!("failed to initialize logging: {}", e))?;

    let initial = document.map(lifecycle::startup::decode_initial);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "config-plane starting");

    let options = StartupOptions {
        config_path: args.config,
        watch: args.watch,
        listen: args.listen,
        metrics_address: args.metrics_address,
        admin: AdminOptions {
            api_key: args.api_key,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            max_body_bytes: args.max_body_bytes,
        },
    };

    lifecycle::run(options, initial).await?;
    Ok(())
}
