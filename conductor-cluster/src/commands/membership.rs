use super::{record, BatchReport, OpsContext};
use crate::error::{OpsError, Result};
use crate::membership::MembershipPlan;
use crate::network::Network;
use tracing::{info, warn};

/// Remove `sequencer_id` from the Raft group via the current leader
pub async fn remove_server(ctx: &mut OpsContext, network: &str, sequencer_id: &str) -> Result<()> {
    let result = async {
        let network_ref = ctx.refreshed(network).await?;
        network_ref.require_sequencer(sequencer_id)?;
        let leader = network_ref
            .find_conductor_leader()
            .require("conductor leader", network)?;

        info!(
            network = %network,
            leader = %leader.sequencer_id,
            server = %sequencer_id,
            "Removing server"
        );
        leader.remove_server(sequencer_id).await
    }
    .await;

    record("remove_server", network, &result, true);
    result
}

/// Bring the Raft group in line with each sequencer's configured voting flag
pub async fn update_cluster_membership(ctx: &mut OpsContext, network: &str) -> Result<BatchReport> {
    let result = async {
        let network_ref = ctx.refreshed(network).await?;
        reconcile(network_ref).await
    }
    .await;

    let all_ok = result.as_ref().map_or(false, BatchReport::is_success);
    record("update_cluster_membership", network, &result, all_ok);
    result
}

/// Apply a membership plan against the current snapshot
///
/// A node whose removal fails is not re-added. The current leader's own
/// suffrage is never changed in place.
pub(crate) async fn reconcile(network: &Network) -> Result<BatchReport> {
    let leader = network
        .find_conductor_leader()
        .require("conductor leader", network.name())?;
    let raft = leader.cluster_membership().await?;
    let plan = MembershipPlan::build(network.sequencers(), &raft);

    if plan.removal_count() > 0 {
        info!(
            network = %network.name(),
            removals = plan.removal_count(),
            "Voting status changes require removing and re-adding servers"
        );
    }

    let mut report = BatchReport::default();
    for step in &plan.steps {
        let Some(member) = network.get_sequencer_by_id(&step.sequencer_id) else {
            continue;
        };

        if step.remove_first {
            if member.sequencer_id == leader.sequencer_id {
                let err = OpsError::Precondition(format!(
                    "{} is the current leader, transfer leadership before changing its \
                     voting status",
                    member.sequencer_id
                ));
                warn!(network = %network.name(), error = %err, "Skipping membership change");
                report.record_failure(&member.sequencer_id, &err);
                continue;
            }

            info!(
                network = %network.name(),
                server = %member.sequencer_id,
                "Removing server to update voting status"
            );
            if let Err(e) = leader.remove_server(&member.sequencer_id).await {
                warn!(
                    network = %network.name(),
                    server = %member.sequencer_id,
                    error = %e,
                    "Failed to remove server, not re-adding it"
                );
                report.record_failure(&member.sequencer_id, &e);
                continue;
            }
        }

        match leader.add_server(member).await {
            Ok(()) => {
                info!(
                    network = %network.name(),
                    server = %member.sequencer_id,
                    suffrage = step.add_as.as_str(),
                    "Added server"
                );
                report.record_success(&member.sequencer_id);
            }
            Err(e) => {
                warn!(
                    network = %network.name(),
                    server = %member.sequencer_id,
                    error = %e,
                    "Failed to add server"
                );
                report.record_failure(&member.sequencer_id, &e);
            }
        }
    }

    Ok(report)
}
