//! Conductor Ops Cluster - Inspection and control of op-conductor sequencer clusters
//!
//! This crate talks JSON-RPC to each sequencer's conductor and op-node (and
//! optionally its block builder and rollup-boost sidecar) to observe a
//! network and to perform guarded leadership changes.
//!
//! # Architecture
//!
//! - **Client**: Shared reqwest client with optional extra trust root
//! - **Sequencer**: One node, its endpoints and last observed snapshot
//! - **Network**: Named cluster with derived leader, active and health facts
//! - **Fleet**: All configured networks, built from a TOML config
//! - **Membership**: Diff and plan between voting flags and the Raft group
//! - **Wait**: Refresh-and-poll until a condition holds
//! - **Commands**: Operator commands that check before they mutate
//!
//! # Key Operations
//!
//! - Status: refresh and report every member plus membership drift
//! - Leadership: transfer-leader, override-leader
//! - Conductors: pause, resume
//! - Membership: remove-server, update-cluster-membership
//! - Sequencing: halt-sequencer, force-active-sequencer
//! - Recovery: bootstrap-cluster

pub mod commands;
pub mod config;
pub mod error;
pub mod fleet;
pub mod membership;
pub mod metrics;
pub mod network;
pub mod sequencer;
pub mod types;
pub mod wait;

mod client;

pub use client::RpcClient;
pub use commands::{
    AutoConfirm, BatchReport, BootstrapOptions, BootstrapOutcome, Confirm, NodeFailure,
    OpsContext, OverrideOutcome, StatusReport, Timing,
};
pub use config::{FleetConfig, NetworkConfig, SequencerConfig, Settings};
pub use error::{OpsError, Result};
pub use fleet::Fleet;
pub use membership::{MembershipIssue, MembershipPlan, MembershipStep};
pub use network::{Lookup, Network};
pub use sequencer::{Sequencer, SequencerExtensions, SequencerStatus};
pub use types::*;
pub use wait::{wait_for_condition, Refreshable, WaitPolicy};
