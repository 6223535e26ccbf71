//! Structured logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the level comes from the canonical
//! `logging.level` or the command line.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::schema::{LogFormat, LogLevel};

pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(format: LogFormat, level: LogLevel) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let builder = fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Txt => builder.try_init(),
    }
}

fn default_directives(level: LogLevel) -> String {
    format!(
        "config_plane={lvl},config_cli={lvl},tower_http={lvl}",
        lvl = level.as_filter()
    )
}
