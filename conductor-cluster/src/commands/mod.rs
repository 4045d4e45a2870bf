//! Operator commands
//!
//! Every command refreshes the target network first, checks its
//! preconditions against that snapshot, and only then issues mutating RPCs.
//! A failed precondition therefore never leaves a partial mutation behind.

mod bootstrap;
mod conductor;
mod leadership;
mod membership;
mod sequencing;
mod status;

pub use bootstrap::{bootstrap_cluster, BootstrapOptions, BootstrapOutcome};
pub use conductor::{pause, resume};
pub use leadership::{override_leader, transfer_leader, OverrideOutcome};
pub use membership::{remove_server, update_cluster_membership};
pub use sequencing::{force_active_sequencer, halt_sequencer};
pub use status::{status, MembershipView, RoleHolder, SequencerRow, StatusReport};

use crate::config::Settings;
use crate::error::{OpsError, Result};
use crate::fleet::Fleet;
use crate::metrics;
use crate::network::Network;
use serde::Serialize;
use std::time::Duration;

/// Asks the operator before a destructive step
pub trait Confirm: Send + Sync {
    /// `Ok(false)` means the operator declined
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Accepts every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Delays used between polls and around sequencer hand-offs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for Timing {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            settle_delay: settings.settle_delay(),
        }
    }
}

/// Everything a command needs: the fleet, a way to confirm, and timing
pub struct OpsContext {
    fleet: Fleet,
    confirm: Box<dyn Confirm>,
    timing: Timing,
}

impl OpsContext {
    pub fn new(fleet: Fleet, confirm: Box<dyn Confirm>) -> Self {
        Self {
            fleet,
            confirm,
            timing: Timing::default(),
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Look up a network and refresh every member
    async fn refreshed(&mut self, network: &str) -> Result<&mut Network> {
        let network = self.fleet.network_mut(network)?;
        network.refresh().await;
        Ok(network)
    }
}

/// A sequencer a batch command could not act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeFailure {
    pub sequencer_id: String,
    pub reason: String,
}

/// Per-node outcome of a command that touches several sequencers
///
/// One node failing never stops the remaining nodes from being attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failures: Vec<NodeFailure>,
}

impl BatchReport {
    pub(crate) fn record_success(&mut self, sequencer_id: &str) {
        self.succeeded.push(sequencer_id.to_string());
    }

    pub(crate) fn record_failure(&mut self, sequencer_id: &str, err: &OpsError) {
        let reason = match err {
            OpsError::Node { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        self.failures.push(NodeFailure {
            sequencer_id: sequencer_id.to_string(),
            reason,
        });
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|f| f.sequencer_id.as_str())
            .collect()
    }
}

fn record<T>(command: &str, network: &str, result: &Result<T>, extra_ok: bool) {
    metrics::record_command(command, network, result.is_ok() && extra_ok);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_strips_node_prefix() {
        let mut report = BatchReport::default();
        report.record_success("node-1");
        report.record_failure(
            "node-2",
            &OpsError::Precondition("boom".into()).for_node("node-2"),
        );

        assert!(!report.is_success());
        assert_eq!(report.failed_ids(), vec!["node-2"]);
        assert_eq!(report.failures[0].reason, "Precondition failed: boom");
    }

    #[test]
    fn test_timing_from_settings() {
        let settings = Settings {
            poll_interval_ms: 10,
            settle_delay_ms: 0,
            ..Settings::default()
        };
        let timing = Timing::from(&settings);
        assert_eq!(timing.poll_interval, Duration::from_millis(10));
        assert_eq!(timing.settle_delay, Duration::ZERO);
    }

    #[test]
    fn test_auto_confirm_accepts() {
        assert!(AutoConfirm.confirm("Proceed?").unwrap());
    }
}
