use super::{record, BatchReport, OpsContext};
use crate::error::Result;
use crate::network::Network;
use crate::sequencer::Sequencer;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConductorAction {
    Pause,
    Resume,
}

impl ConductorAction {
    fn as_str(self) -> &'static str {
        match self {
            ConductorAction::Pause => "pause",
            ConductorAction::Resume => "resume",
        }
    }
}

/// Pause one conductor, or every conductor in the network
pub async fn pause(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: Option<&str>,
) -> Result<BatchReport> {
    run(ctx, network, sequencer_id, ConductorAction::Pause).await
}

/// Resume one conductor, or every conductor in the network
pub async fn resume(
    ctx: &mut OpsContext,
    network: &str,
    sequencer_id: Option<&str>,
) -> Result<BatchReport> {
    run(ctx, network, sequencer_id, ConductorAction::Resume).await
}

async fn run(
    ctx: &mut OpsContext,
    name: &str,
    sequencer_id: Option<&str>,
    action: ConductorAction,
) -> Result<BatchReport> {
    let result = async {
        let network = ctx.refreshed(name).await?;
        apply(network, sequencer_id, action).await
    }
    .await;

    let all_ok = result.as_ref().map_or(false, BatchReport::is_success);
    record(action.as_str(), name, &result, all_ok);
    result
}

/// Send the action to each selected conductor independently
pub(crate) async fn apply(
    network: &Network,
    sequencer_id: Option<&str>,
    action: ConductorAction,
) -> Result<BatchReport> {
    let targets: Vec<&Sequencer> = match sequencer_id {
        Some(id) => vec![network.require_sequencer(id)?],
        None => network.sequencers().iter().collect(),
    };

    let mut report = BatchReport::default();
    for sequencer in targets {
        let outcome = match action {
            ConductorAction::Pause => sequencer.pause_conductor().await,
            ConductorAction::Resume => sequencer.resume_conductor().await,
        };
        match outcome {
            Ok(()) => report.record_success(&sequencer.sequencer_id),
            Err(e) => {
                warn!(
                    network = %network.name(),
                    sequencer = %sequencer.sequencer_id,
                    action = action.as_str(),
                    error = %e,
                    "Conductor call failed"
                );
                report.record_failure(&sequencer.sequencer_id, &e);
            }
        }
    }

    info!(
        network = %network.name(),
        action = action.as_str(),
        succeeded = report.succeeded.len(),
        failed = report.failures.len(),
        "Conductor batch finished"
    );
    Ok(report)
}
