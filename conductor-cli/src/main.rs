mod commands;
mod confirm;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conductor_cluster::{BootstrapOptions, FleetConfig, OpsContext, Timing};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "conductor-ops")]
#[command(about = "Inspect and control op-conductor sequencer clusters")]
#[command(version)]
struct Cli {
    /// Fleet configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "CONDUCTOR_CONFIG",
        default_value = "./config.toml"
    )]
    config: PathBuf,

    /// PEM bundle to trust for HTTPS endpoints (overrides cert_path)
    #[arg(long, global = true, env = "CONDUCTOR_CERT")]
    cert: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show every sequencer in a network and check cluster membership
    Status {
        network: String,
    },

    /// Transfer Raft leadership to a sequencer
    TransferLeader {
        network: String,
        sequencer_id: String,

        /// Skip the health and conductor checks
        #[arg(long)]
        force: bool,
    },

    /// Pause conductors
    Pause {
        network: String,

        /// Only pause this sequencer's conductor
        #[arg(long)]
        sequencer_id: Option<String>,
    },

    /// Resume conductors
    Resume {
        network: String,

        /// Only resume this sequencer's conductor
        #[arg(long)]
        sequencer_id: Option<String>,
    },

    /// Force a sequencer to act as leader, or lift a previous override
    OverrideLeader {
        network: String,
        sequencer_id: String,

        /// Remove the override instead of setting it
        #[arg(long)]
        remove: bool,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Remove a server from the Raft group
    RemoveServer {
        network: String,
        sequencer_id: String,
    },

    /// Add missing servers and fix voting status to match the config
    UpdateClusterMembership {
        network: String,
    },

    /// Stop the active sequencer
    HaltSequencer {
        network: String,

        /// Do not require all conductors to be paused
        #[arg(long)]
        force: bool,
    },

    /// Make a sequencer the active one, stopping the current one first
    ForceActiveSequencer {
        network: String,
        sequencer_id: String,

        /// Do not require all conductors to be paused
        #[arg(long)]
        force: bool,
    },

    /// Start a stopped cluster from its paused leader
    BootstrapCluster {
        network: String,

        /// Seconds to wait for every sequencer to become readable
        #[arg(long, default_value = "60")]
        update_timeout_secs: u64,

        /// Seconds to wait for the network to report healthy
        #[arg(long, default_value = "120")]
        healthy_timeout_secs: u64,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = FleetConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    let fleet = config.build_fleet(cli.cert.as_deref())?;
    let mut ctx = OpsContext::new(fleet, Box::new(confirm::StdinConfirm))
        .with_timing(Timing::from(&config.settings));

    match cli.command {
        Commands::Status { network } => commands::run_status(&mut ctx, &network).await?,
        Commands::TransferLeader {
            network,
            sequencer_id,
            force,
        } => commands::run_transfer_leader(&mut ctx, &network, &sequencer_id, force).await?,
        Commands::Pause {
            network,
            sequencer_id,
        } => commands::run_pause(&mut ctx, &network, sequencer_id.as_deref()).await?,
        Commands::Resume {
            network,
            sequencer_id,
        } => commands::run_resume(&mut ctx, &network, sequencer_id.as_deref()).await?,
        Commands::OverrideLeader {
            network,
            sequencer_id,
            remove,
            yes,
        } => commands::run_override_leader(&mut ctx, &network, &sequencer_id, remove, yes).await?,
        Commands::RemoveServer {
            network,
            sequencer_id,
        } => commands::run_remove_server(&mut ctx, &network, &sequencer_id).await?,
        Commands::UpdateClusterMembership { network } => {
            commands::run_update_cluster_membership(&mut ctx, &network).await?
        }
        Commands::HaltSequencer { network, force } => {
            commands::run_halt_sequencer(&mut ctx, &network, force).await?
        }
        Commands::ForceActiveSequencer {
            network,
            sequencer_id,
            force,
        } => {
            commands::run_force_active_sequencer(&mut ctx, &network, &sequencer_id, force).await?
        }
        Commands::BootstrapCluster {
            network,
            update_timeout_secs,
            healthy_timeout_secs,
            yes,
        } => {
            let options = BootstrapOptions {
                update_timeout: Duration::from_secs(update_timeout_secs),
                healthy_timeout: Duration::from_secs(healthy_timeout_secs),
                assume_yes: yes,
            };
            commands::run_bootstrap_cluster(&mut ctx, &network, options).await?
        }
    }

    Ok(())
}
