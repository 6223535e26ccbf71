//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with key/value fields (installed by logging.rs)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout, text or JSON
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Library code only emits; binaries install the subscriber and exporter
//! - Metric updates go through the `metrics` facade and are no-ops without an exporter

pub mod logging;
pub mod metrics;
