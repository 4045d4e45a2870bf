use super::finish_batch;
use anyhow::Result;
use conductor_cluster::commands;
use conductor_cluster::{BootstrapOptions, BootstrapOutcome, OpsContext};

/// Bootstrap a stopped cluster and report each phase
pub async fn run_bootstrap_cluster(
    ctx: &mut OpsContext,
    network: &str,
    options: BootstrapOptions,
) -> Result<()> {
    match commands::bootstrap_cluster(ctx, network, options).await? {
        BootstrapOutcome::AlreadyHealthy => {
            println!("Network {} is already healthy, nothing to do", network);
            Ok(())
        }
        BootstrapOutcome::Declined => {
            println!("Aborted, nothing was changed");
            Ok(())
        }
        BootstrapOutcome::Bootstrapped {
            started_from,
            membership,
            resumed,
        } => {
            match started_from {
                Some(hash) => println!("Started leader sequencer from {}", hash),
                None => println!("Leader was already sequencing"),
            }

            println!();
            println!("Cluster membership");
            println!("------------------");
            let membership_result = finish_batch("update-cluster-membership", &membership);

            println!();
            println!("Resume conductors");
            println!("-----------------");
            let resume_result = finish_batch("resume", &resumed);

            membership_result.and(resume_result)?;
            println!();
            println!("Network {} bootstrapped", network);
            Ok(())
        }
    }
}
