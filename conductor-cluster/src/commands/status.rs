use super::{record, OpsContext};
use crate::error::Result;
use crate::membership::{self, MembershipIssue};
use crate::network::{Lookup, Network};
use crate::sequencer::{SequencerExtensions, SequencerStatus};
use tracing::warn;

/// Who, if anyone, holds a role that should be unique
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleHolder {
    Nobody,
    One(String),
    /// Split-brain: several members claim the role
    Many(Vec<String>),
}

impl From<Lookup<'_>> for RoleHolder {
    fn from(lookup: Lookup<'_>) -> Self {
        match lookup {
            Lookup::None => RoleHolder::Nobody,
            Lookup::Unique(s) => RoleHolder::One(s.sequencer_id.clone()),
            Lookup::Ambiguous(_) => RoleHolder::Many(lookup.ids()),
        }
    }
}

impl RoleHolder {
    pub fn is(&self, sequencer_id: &str) -> bool {
        match self {
            RoleHolder::Nobody => false,
            RoleHolder::One(id) => id == sequencer_id,
            RoleHolder::Many(ids) => ids.iter().any(|id| id == sequencer_id),
        }
    }
}

/// Result of comparing configuration against the leader's Raft view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipView {
    Checked(Vec<MembershipIssue>),
    /// The leader could not be asked
    Unavailable(String),
    /// No unique leader to ask
    NoLeader,
}

#[derive(Debug, Clone)]
pub struct SequencerRow {
    pub sequencer_id: String,
    pub voting: bool,
    pub status: SequencerStatus,
    pub extensions: SequencerExtensions,
    pub update_successful: bool,
}

/// Read-only view of a network after a refresh
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub network: String,
    pub rows: Vec<SequencerRow>,
    pub leader: RoleHolder,
    pub active: RoleHolder,
    pub healthy: bool,
    pub update_successful: bool,
    pub membership: MembershipView,
}

/// Refresh a network and describe it
pub async fn status(ctx: &mut OpsContext, network: &str) -> Result<StatusReport> {
    let result = build_report(ctx, network).await;
    record("status", network, &result, true);
    result
}

async fn build_report(ctx: &mut OpsContext, name: &str) -> Result<StatusReport> {
    let network = ctx.refreshed(name).await?;
    let membership = check_membership(network).await;

    let rows = network
        .sequencers()
        .iter()
        .map(|s| SequencerRow {
            sequencer_id: s.sequencer_id.clone(),
            voting: s.voting,
            status: s.status().clone(),
            extensions: s.extensions().clone(),
            update_successful: s.update_successful(),
        })
        .collect();

    Ok(StatusReport {
        network: network.name().to_string(),
        rows,
        leader: network.find_conductor_leader().into(),
        active: network.find_active_sequencer().into(),
        healthy: network.is_healthy(),
        update_successful: network.update_successful(),
        membership,
    })
}

async fn check_membership(network: &Network) -> MembershipView {
    let leader = match network.find_conductor_leader() {
        Lookup::Unique(leader) => leader,
        Lookup::None => {
            warn!(network = %network.name(), "No conductor leader, skipping membership check");
            return MembershipView::NoLeader;
        }
        ambiguous @ Lookup::Ambiguous(_) => {
            warn!(
                network = %network.name(),
                leaders = ?ambiguous.ids(),
                "Multiple conductor leaders, skipping membership check"
            );
            return MembershipView::NoLeader;
        }
    };

    match leader.cluster_membership().await {
        Ok(raft) => {
            let issues = membership::diff(network.sequencers(), &raft);
            for issue in &issues {
                warn!(network = %network.name(), "{}", issue);
            }
            MembershipView::Checked(issues)
        }
        Err(e) => {
            warn!(network = %network.name(), error = %e, "Failed to fetch cluster membership");
            MembershipView::Unavailable(e.to_string())
        }
    }
}
