//! Reconciliation between configured voting flags and the live Raft group
//!
//! The Raft configuration held by the leader is the ground truth. Each
//! configured sequencer is compared against it:
//!
//! ```text
//! configured, absent from raft        → Missing        → add
//! configured, present, wrong suffrage → WrongSuffrage  → remove, then add
//! configured, present, right suffrage → (no issue)     → add (idempotent)
//! present in raft, not configured     → Unconfigured   → reported only
//! ```

use crate::sequencer::Sequencer;
use crate::types::{ClusterMembership, Suffrage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrepancy between configuration and the Raft group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipIssue {
    /// Configured sequencer not present in the Raft group
    Missing { id: String },
    /// Present, but with the opposite suffrage
    WrongSuffrage {
        id: String,
        expected: Suffrage,
        actual: Suffrage,
    },
    /// Raft group member that no configured sequencer accounts for
    Unconfigured { id: String },
}

impl MembershipIssue {
    pub fn id(&self) -> &str {
        match self {
            MembershipIssue::Missing { id }
            | MembershipIssue::WrongSuffrage { id, .. }
            | MembershipIssue::Unconfigured { id } => id,
        }
    }
}

impl fmt::Display for MembershipIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipIssue::Missing { id } => write!(f, "{} is not in the cluster", id),
            MembershipIssue::WrongSuffrage {
                id,
                expected,
                actual,
            } => write!(
                f,
                "{} does not have the correct voting status (expected {}, found {})",
                id,
                expected.as_str(),
                actual.as_str()
            ),
            MembershipIssue::Unconfigured { id } => {
                write!(f, "{} is in the cluster but not in the configuration", id)
            }
        }
    }
}

/// Compare configured sequencers against the Raft group
pub fn diff(sequencers: &[Sequencer], membership: &ClusterMembership) -> Vec<MembershipIssue> {
    let mut issues = Vec::new();

    for sequencer in sequencers {
        let expected = Suffrage::from_voting(sequencer.voting);
        match membership.get(&sequencer.sequencer_id) {
            None => issues.push(MembershipIssue::Missing {
                id: sequencer.sequencer_id.clone(),
            }),
            Some(server) if server.suffrage != expected => {
                issues.push(MembershipIssue::WrongSuffrage {
                    id: sequencer.sequencer_id.clone(),
                    expected,
                    actual: server.suffrage,
                })
            }
            Some(_) => {}
        }
    }

    for server in &membership.servers {
        if !sequencers.iter().any(|s| s.sequencer_id == server.id) {
            issues.push(MembershipIssue::Unconfigured {
                id: server.id.clone(),
            });
        }
    }

    issues
}

/// One configured sequencer's reconciliation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipStep {
    pub sequencer_id: String,
    /// Remove from the Raft group before re-adding
    pub remove_first: bool,
    pub add_as: Suffrage,
}

/// Ordered steps that bring the Raft group in line with configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub steps: Vec<MembershipStep>,
}

impl MembershipPlan {
    /// Plan one step per configured sequencer, in configuration order
    pub fn build(sequencers: &[Sequencer], membership: &ClusterMembership) -> Self {
        let steps = sequencers
            .iter()
            .map(|sequencer| {
                let add_as = Suffrage::from_voting(sequencer.voting);
                let remove_first = membership
                    .get(&sequencer.sequencer_id)
                    .map_or(false, |server| server.suffrage != add_as);
                MembershipStep {
                    sequencer_id: sequencer.sequencer_id.clone(),
                    remove_first,
                    add_as,
                }
            })
            .collect();

        Self { steps }
    }

    pub fn removal_count(&self) -> usize {
        self.steps.iter().filter(|s| s.remove_first).count()
    }
}
