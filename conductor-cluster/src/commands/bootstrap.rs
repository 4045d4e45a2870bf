//! Cold-start a sequencer cluster
//!
//! ```text
//! wait: every member readable ──→ healthy? ──yes──→ done (no-op)
//!                                    │ no
//!                                    ▼
//!        unique paused leader, no other active sequencer, confirm
//!                                    ▼
//!        leader not sequencing? → start it from its unsafe head
//!                                    ▼
//!        wait: healthy → reconcile membership → resume all conductors
//! ```

use super::conductor::{self, ConductorAction};
use super::membership::reconcile;
use super::sequencing::activate;
use super::{record, BatchReport, OpsContext};
use crate::error::{OpsError, Result};
use crate::network::Network;
use crate::wait::{wait_for_condition, WaitPolicy};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Limit for every member to become readable
    pub update_timeout: Duration,
    /// Limit for every member to report healthy once sequencing starts
    pub healthy_timeout: Duration,
    pub assume_yes: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            update_timeout: Duration::from_secs(60),
            healthy_timeout: Duration::from_secs(120),
            assume_yes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Network was already healthy; nothing was changed
    AlreadyHealthy,
    /// The operator declined; nothing was changed
    Declined,
    Bootstrapped {
        /// Hash the leader was started from, if it had to be started
        started_from: Option<String>,
        membership: BatchReport,
        resumed: BatchReport,
    },
}

/// Bring a stopped cluster to a healthy, fully-membered, unpaused state
pub async fn bootstrap_cluster(
    ctx: &mut OpsContext,
    network: &str,
    options: BootstrapOptions,
) -> Result<BootstrapOutcome> {
    let result = run(ctx, network, options).await;
    let all_ok = match &result {
        Ok(BootstrapOutcome::Bootstrapped {
            membership,
            resumed,
            ..
        }) => membership.is_success() && resumed.is_success(),
        Ok(_) => true,
        Err(_) => false,
    };
    record("bootstrap_cluster", network, &result, all_ok);
    result
}

async fn run(
    ctx: &mut OpsContext,
    name: &str,
    options: BootstrapOptions,
) -> Result<BootstrapOutcome> {
    let timing = ctx.timing;
    let network = ctx.fleet.network_mut(name)?;

    wait_for_condition(
        "all sequencers readable",
        network,
        true,
        Network::update_successful,
        WaitPolicy::new(options.update_timeout, timing.poll_interval),
    )
    .await?;

    if network.is_healthy() {
        info!(network = %name, "Network already healthy, nothing to bootstrap");
        return Ok(BootstrapOutcome::AlreadyHealthy);
    }

    let leader = network
        .find_conductor_leader()
        .require("conductor leader", name)?;
    if leader.status().conductor_active != Some(false) {
        return Err(OpsError::Precondition(format!(
            "Conductor on leader {} must be paused before bootstrapping",
            leader.sequencer_id
        )));
    }
    let others_active: Vec<&str> = network
        .sequencers()
        .iter()
        .filter(|s| s.sequencer_id != leader.sequencer_id)
        .filter(|s| s.status().sequencer_active == Some(true))
        .map(|s| s.sequencer_id.as_str())
        .collect();
    if !others_active.is_empty() {
        return Err(OpsError::Precondition(format!(
            "Sequencers other than leader {} are active: {}",
            leader.sequencer_id,
            others_active.join(", ")
        )));
    }

    if !options.assume_yes {
        let prompt = format!(
            "Bootstrap network {} with {} as the starting sequencer?",
            name, leader.sequencer_id
        );
        if !ctx.confirm.confirm(&prompt)? {
            info!(network = %name, "Bootstrap declined");
            return Ok(BootstrapOutcome::Declined);
        }
    }

    let started_from = if leader.status().sequencer_active == Some(true) {
        info!(network = %name, leader = %leader.sequencer_id, "Leader already sequencing");
        None
    } else {
        Some(activate(network, leader, timing.settle_delay).await?)
    };

    wait_for_condition(
        "network healthy",
        network,
        true,
        Network::is_healthy,
        WaitPolicy::new(options.healthy_timeout, timing.poll_interval),
    )
    .await?;

    let membership = reconcile(network).await?;
    let resumed = conductor::apply(network, None, ConductorAction::Resume).await?;

    info!(
        network = %name,
        membership_failures = membership.failures.len(),
        resume_failures = resumed.failures.len(),
        "Bootstrap finished"
    );
    Ok(BootstrapOutcome::Bootstrapped {
        started_from,
        membership,
        resumed,
    })
}
