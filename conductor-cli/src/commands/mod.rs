mod bootstrap;
mod control;
mod status;

pub use bootstrap::run_bootstrap_cluster;
pub use control::{
    run_force_active_sequencer, run_halt_sequencer, run_override_leader, run_pause,
    run_remove_server, run_resume, run_transfer_leader, run_update_cluster_membership,
};
pub use status::run_status;

use anyhow::Result;
use conductor_cluster::BatchReport;

/// Render an observed flag
pub(crate) fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "?",
    }
}

/// Print per-node results and fail if any node failed
pub(crate) fn finish_batch(action: &str, report: &BatchReport) -> Result<()> {
    for id in &report.succeeded {
        println!("{:<20} ok", id);
    }
    for failure in &report.failures {
        println!("{:<20} FAILED: {}", failure.sequencer_id, failure.reason);
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} failed on {} of {} sequencers: {}",
            action,
            report.failures.len(),
            report.failures.len() + report.succeeded.len(),
            report.failed_ids().join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_cluster::NodeFailure;

    #[test]
    fn test_flag_rendering() {
        assert_eq!(flag(Some(true)), "yes");
        assert_eq!(flag(Some(false)), "no");
        assert_eq!(flag(None), "?");
    }

    #[test]
    fn test_finish_batch_fails_on_any_failure() {
        let mut report = BatchReport::default();
        report.succeeded.push("node-1".into());
        assert!(finish_batch("pause", &report).is_ok());

        report.failures.push(NodeFailure {
            sequencer_id: "node-2".into(),
            reason: "boom".into(),
        });
        let err = finish_batch("pause", &report).unwrap_err();
        assert_eq!(err.to_string(), "pause failed on 1 of 2 sequencers: node-2");
    }
}
