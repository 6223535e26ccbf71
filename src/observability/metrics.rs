//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_updates_total` (counter): update attempts by `result` (accepted, rejected)
//! - `config_update_duration_seconds` (histogram): decode + validate + swap time
//! - `config_reload_signals_total` (counter): reload signals by `outcome` (sent, dropped)
//! - `control_api_requests_total` (counter): control API calls by `operation`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

pub fn record_config_update(result: &'static str, start: Instant) {
    counter!("config_updates_total", "result" => result).increment(1);
    histogram!("config_update_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_reload_signal(outcome: &'static str) {
    counter!("config_reload_signals_total", "outcome" => outcome).increment(1);
}

pub fn record_api_request(operation: &'static str) {
    counter!("control_api_requests_total", "operation" => operation).increment(1);
}
