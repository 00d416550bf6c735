//! Metrics collection.
//!
//! # Metrics
//! - `erc20_rpc_requests_total` (counter): RPC calls by method, outcome
//! - `erc20_transfers_total` (counter): pipeline runs by terminal outcome
//! - `erc20_confirmation_seconds` (histogram): broadcast-to-receipt latency
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Labels are static strings to keep cardinality bounded

use std::time::Duration;

/// Record one RPC call.
pub fn record_rpc_call(method: &'static str, outcome: &'static str) {
    metrics::counter!("erc20_rpc_requests_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

/// Record a finished pipeline run (`done`, or the failing stage).
pub fn record_transfer(outcome: &'static str) {
    metrics::counter!("erc20_transfers_total", "outcome" => outcome).increment(1);
}

/// Record how long a receipt took to appear.
pub fn record_confirmation_latency(elapsed: Duration) {
    metrics::histogram!("erc20_confirmation_seconds").record(elapsed.as_secs_f64());
}
