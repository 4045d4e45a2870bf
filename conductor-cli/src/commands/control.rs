use super::finish_batch;
use anyhow::Result;
use conductor_cluster::commands;
use conductor_cluster::{OpsContext, OverrideOutcome};

/// Transfer leadership to a sequencer
pub async fn run_transfer_leader(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
    force: bool,
) -> Result<()> {
    commands::transfer_leader(ctx, network, sequencer_id, force).await?;
    println!("Leadership transfer to {} requested", sequencer_id);
    Ok(())
}

/// Pause one or all conductors
pub async fn run_pause(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: Option<&str>,
) -> Result<()> {
    let report = commands::pause(ctx, network, sequencer_id).await?;
    finish_batch("pause", &report)
}

/// Resume one or all conductors
pub async fn run_resume(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: Option<&str>,
) -> Result<()> {
    let report = commands::resume(ctx, network, sequencer_id).await?;
    finish_batch("resume", &report)
}

/// Set or lift a leader override
pub async fn run_override_leader(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
    remove: bool,
    yes: bool,
) -> Result<()> {
    match commands::override_leader(ctx, network, sequencer_id, remove, yes).await? {
        OverrideOutcome::Declined => println!("Aborted, nothing was changed"),
        OverrideOutcome::Applied if remove => {
            println!("Leader override removed on {}", sequencer_id);
            println!("Restart the op-node on {} to clear its leader override", sequencer_id);
        }
        OverrideOutcome::Applied => println!("Leader override enabled on {}", sequencer_id),
    }
    Ok(())
}

/// Remove a server from the Raft group
pub async fn run_remove_server(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
) -> Result<()> {
    commands::remove_server(ctx, network, sequencer_id).await?;
    println!("Removed {} from the cluster", sequencer_id);
    Ok(())
}

/// Reconcile Raft membership with configured voting flags
pub async fn run_update_cluster_membership(ctx: &mut OpsContext, network: &str) -> Result<()> {
    let report = commands::update_cluster_membership(ctx, network).await?;
    finish_batch("update-cluster-membership", &report)
}

/// Stop the active sequencer
pub async fn run_halt_sequencer(ctx: &mut OpsContext, network: &str, force: bool) -> Result<()> {
    let hash = commands::halt_sequencer(ctx, network, force).await?;
    println!("Sequencer halted at {}", display_hash(&hash));
    Ok(())
}

/// Make a sequencer the active one
pub async fn run_force_active_sequencer(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
    force: bool,
) -> Result<()> {
    let hash = commands::force_active_sequencer(ctx, network, sequencer_id, force).await?;
    println!("Started {} from {}", sequencer_id, hash);
    Ok(())
}

fn display_hash(hash: &str) -> &str {
    if hash.is_empty() {
        "an unknown block"
    } else {
        hash
    }
}
