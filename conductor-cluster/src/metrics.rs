//! Fleet observability metrics
//!
//! Emits through the `metrics` facade:
//! - RPC duration and errors per sequencer id and method
//! - Per-sequencer role and health state after each refresh
//! - Network-level health and refresh success

use crate::error::{OpsError, Result};
use crate::sequencer::SequencerStatus;
use std::time::{Duration, Instant};

/// Record one finished RPC call against a sequencer
///
/// Series are labelled by sequencer id, never by endpoint URL, so they stay
/// stable when a node's address changes. `error_type` is `None` on success.
pub fn record_rpc(sequencer_id: &str, method: &str, error_type: Option<&str>, elapsed: Duration) {
    metrics::histogram!(
        "conductor_ops_rpc_duration_seconds",
        "sequencer" => sequencer_id.to_string(),
        "method" => method.to_string(),
    )
    .record(elapsed.as_secs_f64());

    metrics::counter!(
        "conductor_ops_rpc_requests_total",
        "sequencer" => sequencer_id.to_string(),
        "method" => method.to_string(),
        "status" => if error_type.is_some() { "error" } else { "ok" },
    )
    .increment(1);

    if let Some(error_type) = error_type {
        metrics::counter!(
            "conductor_ops_rpc_errors_total",
            "sequencer" => sequencer_id.to_string(),
            "method" => method.to_string(),
            "error_type" => error_type.to_string(),
        )
        .increment(1);
    }
}

/// Update the role/health gauges of one sequencer
pub fn update_sequencer_state(network: &str, sequencer_id: &str, status: &SequencerStatus) {
    let gauge = |value: Option<bool>| match value {
        Some(true) => 1.0,
        Some(false) => 0.0,
        None => -1.0,
    };

    metrics::gauge!(
        "conductor_ops_sequencer_healthy",
        "network" => network.to_string(),
        "sequencer" => sequencer_id.to_string(),
    )
    .set(gauge(status.sequencer_healthy));

    metrics::gauge!(
        "conductor_ops_sequencer_active",
        "network" => network.to_string(),
        "sequencer" => sequencer_id.to_string(),
    )
    .set(gauge(status.sequencer_active));

    metrics::gauge!(
        "conductor_ops_conductor_leader",
        "network" => network.to_string(),
        "sequencer" => sequencer_id.to_string(),
    )
    .set(gauge(status.conductor_leader));

    if let Some(unsafe_l2) = &status.unsafe_l2 {
        metrics::gauge!(
            "conductor_ops_unsafe_l2_number",
            "network" => network.to_string(),
            "sequencer" => sequencer_id.to_string(),
        )
        .set(unsafe_l2.number as f64);
    }
}

/// Record the outcome of a full network refresh
pub fn record_network_refresh(network: &str, healthy: bool, successful: bool, duration: Duration) {
    metrics::gauge!("conductor_ops_network_healthy", "network" => network.to_string())
        .set(if healthy { 1.0 } else { 0.0 });

    metrics::gauge!("conductor_ops_network_update_successful", "network" => network.to_string())
        .set(if successful { 1.0 } else { 0.0 });

    metrics::histogram!("conductor_ops_network_refresh_seconds", "network" => network.to_string())
        .record(duration.as_secs_f64());
}

/// Record a mutating command being executed
pub fn record_command(command: &str, network: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    metrics::counter!(
        "conductor_ops_commands_total",
        "command" => command.to_string(),
        "network" => network.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Times one RPC call from `start` until `finish`
pub struct RpcTimer {
    sequencer_id: String,
    method: String,
    started: Instant,
}

impl RpcTimer {
    pub fn start(sequencer_id: &str, method: &str) -> Self {
        Self {
            sequencer_id: sequencer_id.to_string(),
            method: method.to_string(),
            started: Instant::now(),
        }
    }

    /// Record the call's duration and outcome
    pub fn finish<T>(self, result: &Result<T>) {
        let error_type = result.as_ref().err().map(OpsError::error_type);
        record_rpc(
            &self.sequencer_id,
            &self.method,
            error_type,
            self.started.elapsed(),
        );
    }
}
