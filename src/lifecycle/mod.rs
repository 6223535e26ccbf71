//! Process lifecycle for the control-plane daemon.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Initial config → ConfigStore → metrics exporter → route registry
//!     → file watcher (optional) → control API listener
//!
//! Shutdown (shutdown.rs):
//!     trigger() → route registry stops → control API drains → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!     SIGHUP         → re-read the config file through the store
//! ```
//!
//! # Design Decisions
//! - A bad initial config is logged, not fatal; the store starts empty
//! - The control API binds last so it never serves a half-built process
//! - SIGHUP reloads go through the same validation as API updates

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError, StartupOptions};
