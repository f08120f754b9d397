//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pedigree_transactions_total` (counter): terminal outcomes by `outcome`
//! - `pedigree_pending_transactions` (gauge): 1 while the slot is occupied
//! - `pedigree_registry_reads_total` (counter): `retrieveDog` calls by `result`
//! - `pedigree_network_switches_total` (counter): switch requests by `result`

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Serve Prometheus metrics on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(err) => tracing::error!(address = %addr, error = %err, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction_outcome(outcome: &'static str) {
    metrics::counter!("pedigree_transactions_total", "outcome" => outcome).increment(1);
}

pub fn set_pending_transactions(count: usize) {
    metrics::gauge!("pedigree_pending_transactions").set(count as f64);
}

pub fn record_registry_read(result: &'static str) {
    metrics::counter!("pedigree_registry_reads_total", "result" => result).increment(1);
}

pub fn record_network_switch(accepted: bool) {
    let result = if accepted { "accepted" } else { "failed" };
    metrics::counter!("pedigree_network_switches_total", "result" => result).increment(1);
}
