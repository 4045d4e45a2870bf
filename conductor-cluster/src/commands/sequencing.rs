use super::{record, OpsContext};
use crate::error::{OpsError, Result};
use crate::network::{Lookup, Network};
use crate::sequencer::Sequencer;
use std::time::Duration;
use tracing::{info, warn};

fn require_paused(network: &Network, force: bool) -> Result<()> {
    if !force && !network.all_conductors_paused() {
        return Err(OpsError::Precondition(format!(
            "Not all conductors in network {} are paused, pause them first or use --force",
            network.name()
        )));
    }
    Ok(())
}

/// Stop the active sequencer; returns the hash it stopped at
pub async fn halt_sequencer(ctx: &mut OpsContext, network: &str, force: bool) -> Result<String> {
    let result = async {
        let network_ref = ctx.refreshed(network).await?;
        require_paused(network_ref, force)?;

        let active = network_ref
            .find_active_sequencer()
            .require("active sequencer", network)?;

        info!(network = %network, sequencer = %active.sequencer_id, "Stopping sequencer");
        let hash = active.stop_sequencer().await?;
        info!(
            network = %network,
            sequencer = %active.sequencer_id,
            hash = %hash,
            "Stopped sequencer"
        );
        Ok(hash)
    }
    .await;

    record("halt_sequencer", network, &result, true);
    result
}

/// Make `sequencer_id` the active sequencer, stopping whichever node is
/// currently active first
pub async fn force_active_sequencer(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: &str,
    force: bool,
) -> Result<String> {
    let settle_delay = ctx.timing.settle_delay;
    let result = async {
        let network_ref = ctx.refreshed(network).await?;
        let target = network_ref.require_sequencer(sequencer_id)?;
        require_paused(network_ref, force)?;
        activate(network_ref, target, settle_delay).await
    }
    .await;

    record("force_active_sequencer", network, &result, true);
    result
}

/// Start `target` from the head of the currently active sequencer
///
/// The start hash is the one returned when stopping the active node, or
/// the target's own unsafe head when nothing is active. Returns the hash
/// the target was started from.
pub(crate) async fn activate(
    network: &Network,
    target: &Sequencer,
    settle_delay: Duration,
) -> Result<String> {
    let mut hash = target
        .status()
        .unsafe_l2
        .as_ref()
        .map(|head| head.hash.clone())
        .unwrap_or_default();

    match network.find_active_sequencer() {
        Lookup::Unique(active) => {
            info!(
                network = %network.name(),
                sequencer = %active.sequencer_id,
                "Stopping currently active sequencer"
            );
            hash = active.stop_sequencer().await?;
        }
        Lookup::None => {
            warn!(
                network = %network.name(),
                "No active sequencer, starting from the target's unsafe head"
            );
        }
        Lookup::Ambiguous(all) => {
            return Err(OpsError::Ambiguous {
                role: "active sequencer",
                network: network.name().to_string(),
                ids: all.iter().map(|s| s.sequencer_id.clone()).collect(),
            });
        }
    }

    if hash.is_empty() {
        return Err(OpsError::Precondition(format!(
            "No block hash available to start sequencer {}",
            target.sequencer_id
        )));
    }

    tokio::time::sleep(settle_delay).await;

    info!(
        network = %network.name(),
        sequencer = %target.sequencer_id,
        hash = %hash,
        "Starting sequencer"
    );
    target.start_sequencer(&hash).await?;
    Ok(hash)
}
