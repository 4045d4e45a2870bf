use super::{record, OpsContext};
use crate::error::{OpsError, Result};
use tracing::{info, warn};

/// Whether an override command went ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOutcome {
    Applied,
    /// The operator declined; nothing was changed
    Declined,
}

/// Hand Raft leadership to `sequencer_id`
///
/// Without `force` the target must be healthy and both the target's and
/// the current leader's conductors active.
pub async fn transfer_leader(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
    force: bool,
) -> Result<()> {
    let result = transfer(ctx, network, sequencer_id, force).await;
    record("transfer_leader", network, &result, true);
    result
}

async fn transfer(
    ctx: &mut OpsContext,
    name: &str,
    sequencer_id: &str,
    force: bool,
) -> Result<()> {
    let network = ctx.refreshed(name).await?;

    let target = network.require_sequencer(sequencer_id)?;
    if !target.voting {
        return Err(OpsError::Precondition(format!(
            "Sequencer {} is not a voter and cannot become leader",
            sequencer_id
        )));
    }

    let leader = network
        .find_conductor_leader()
        .require("conductor leader", name)?;

    if !force {
        if target.status().sequencer_healthy != Some(true) {
            return Err(OpsError::Precondition(format!(
                "Sequencer {} is not healthy, use --force to transfer anyway",
                sequencer_id
            )));
        }
        for (role, node) in [("target", target), ("leader", leader)] {
            if node.status().conductor_active != Some(true) {
                return Err(OpsError::Precondition(format!(
                    "Conductor on {} {} is not active, use --force to transfer anyway",
                    role, node.sequencer_id
                )));
            }
        }
    }

    info!(
        network = %name,
        from = %leader.sequencer_id,
        to = %target.sequencer_id,
        force,
        "Transferring leadership"
    );
    leader.transfer_leader_to(target).await?;

    network.refresh().await;
    match network.find_conductor_leader().unique() {
        Some(current) if current.sequencer_id == sequencer_id => {
            info!(network = %name, leader = %sequencer_id, "Leadership transfer confirmed");
        }
        _ => warn!(
            network = %name,
            target = %sequencer_id,
            "Leadership transfer not yet visible in conductor state"
        ),
    }

    Ok(())
}

/// Force `sequencer_id` to behave as leader, or lift a previous override
///
/// Lifting the override asks for confirmation unless `assume_yes`; the
/// op-node still has to be restarted by hand afterwards.
pub async fn override_leader(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
    remove: bool,
    assume_yes: bool,
) -> Result<OverrideOutcome> {
    let result = apply_override(ctx, network, sequencer_id, remove, assume_yes).await;
    record("override_leader", network, &result, true);
    result
}

async fn apply_override(
    ctx: &mut OpsContext,
    name: &str,
    sequencer_id: &str,
    remove: bool,
    assume_yes: bool,
) -> Result<OverrideOutcome> {
    let network = ctx.fleet.network_mut(name)?;
    network.refresh().await;
    let target = network.require_sequencer(sequencer_id)?;

    if !remove {
        target.override_conductor_leader(true).await?;
        target.admin_override_leader().await?;
        info!(network = %name, sequencer = %sequencer_id, "Leader override enabled");
        return Ok(OverrideOutcome::Applied);
    }

    if !assume_yes {
        let prompt = format!(
            "Removing the leader override on {} requires restarting its op-node afterwards. \
             Continue?",
            sequencer_id
        );
        if !ctx.confirm.confirm(&prompt)? {
            info!(sequencer = %sequencer_id, "Override removal declined");
            return Ok(OverrideOutcome::Declined);
        }
    }

    target.override_conductor_leader(false).await?;
    warn!(
        network = %name,
        sequencer = %sequencer_id,
        "Leader override removed, restart the op-node on this sequencer to clear its override"
    );
    Ok(OverrideOutcome::Applied)
}
