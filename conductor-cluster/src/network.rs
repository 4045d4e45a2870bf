//! A named cluster of sequencers and the facts derived from their snapshots
//!
//! Derived facts (leader, active sequencer, health) are recomputed from the
//! current member snapshots on every call and never cached.

use crate::error::{OpsError, Result};
use crate::metrics;
use crate::sequencer::Sequencer;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, warn};

/// Default bound on concurrently refreshing members
pub const DEFAULT_MAX_CONCURRENT_REFRESHES: usize = 16;

/// Outcome of a lookup where at most one match is expected
#[derive(Debug, Clone)]
pub enum Lookup<'a> {
    /// No member matches
    None,
    /// Exactly one member matches
    Unique(&'a Sequencer),
    /// More than one member matches (split-brain observed)
    Ambiguous(Vec<&'a Sequencer>),
}

impl<'a> Lookup<'a> {
    fn from_matches(mut matches: Vec<&'a Sequencer>) -> Self {
        match matches.len() {
            0 => Lookup::None,
            1 => Lookup::Unique(matches.remove(0)),
            _ => Lookup::Ambiguous(matches),
        }
    }

    pub fn unique(&self) -> Option<&'a Sequencer> {
        match self {
            Lookup::Unique(s) => Some(*s),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Lookup::None)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Lookup::Ambiguous(_))
    }

    /// Ids of every matching member
    pub fn ids(&self) -> Vec<String> {
        match self {
            Lookup::None => Vec::new(),
            Lookup::Unique(s) => vec![s.sequencer_id.clone()],
            Lookup::Ambiguous(all) => all.iter().map(|s| s.sequencer_id.clone()).collect(),
        }
    }

    /// Demand exactly one match, turning the other cases into errors
    pub fn require(self, role: &'static str, network: &str) -> Result<&'a Sequencer> {
        match self {
            Lookup::Unique(s) => Ok(s),
            Lookup::None => Err(OpsError::NotFound {
                role,
                network: network.to_string(),
            }),
            Lookup::Ambiguous(all) => Err(OpsError::Ambiguous {
                role,
                network: network.to_string(),
                ids: all.iter().map(|s| s.sequencer_id.clone()).collect(),
            }),
        }
    }
}

/// One named sequencer cluster
#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    sequencers: Vec<Sequencer>,
    max_concurrent_refreshes: usize,
}

impl Network {
    pub fn new(name: impl Into<String>, sequencers: Vec<Sequencer>) -> Self {
        Self {
            name: name.into(),
            sequencers,
            max_concurrent_refreshes: DEFAULT_MAX_CONCURRENT_REFRESHES,
        }
    }

    #[must_use]
    pub fn with_max_concurrent_refreshes(mut self, limit: usize) -> Self {
        self.max_concurrent_refreshes = limit.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in configuration order
    pub fn sequencers(&self) -> &[Sequencer] {
        &self.sequencers
    }

    #[cfg(test)]
    pub(crate) fn sequencers_mut(&mut self) -> &mut [Sequencer] {
        &mut self.sequencers
    }

    pub fn sequencer_ids(&self) -> Vec<String> {
        self.sequencers
            .iter()
            .map(|s| s.sequencer_id.clone())
            .collect()
    }

    /// Refresh every member concurrently; returns once all have finished
    pub async fn refresh(&mut self) {
        let start = Instant::now();

        stream::iter(self.sequencers.iter_mut())
            .for_each_concurrent(self.max_concurrent_refreshes, |sequencer| {
                sequencer.refresh()
            })
            .await;

        let healthy = self.is_healthy();
        let successful = self.update_successful();

        for sequencer in &self.sequencers {
            metrics::update_sequencer_state(
                &self.name,
                &sequencer.sequencer_id,
                sequencer.status(),
            );
        }
        metrics::record_network_refresh(&self.name, healthy, successful, start.elapsed());

        if !successful {
            let failed: Vec<&str> = self
                .sequencers
                .iter()
                .filter(|s| !s.update_successful())
                .map(|s| s.sequencer_id.as_str())
                .collect();
            warn!(
                network = %self.name,
                failed = ?failed,
                "Some sequencers could not be fully refreshed"
            );
        }

        debug!(
            network = %self.name,
            healthy,
            successful,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Refreshed network"
        );
    }

    pub fn get_sequencer_by_id(&self, sequencer_id: &str) -> Option<&Sequencer> {
        self.sequencers
            .iter()
            .find(|s| s.sequencer_id == sequencer_id)
    }

    /// Like [`Network::get_sequencer_by_id`] but a missing id is an error
    pub fn require_sequencer(&self, sequencer_id: &str) -> Result<&Sequencer> {
        self.get_sequencer_by_id(sequencer_id)
            .ok_or_else(|| OpsError::SequencerNotFound {
                id: sequencer_id.to_string(),
                network: self.name.clone(),
            })
    }

    /// Members whose conductor reports itself as Raft leader
    pub fn find_conductor_leader(&self) -> Lookup<'_> {
        Lookup::from_matches(
            self.sequencers
                .iter()
                .filter(|s| s.status().conductor_leader == Some(true))
                .collect(),
        )
    }

    /// Members whose op-node reports itself as actively sequencing
    pub fn find_active_sequencer(&self) -> Lookup<'_> {
        Lookup::from_matches(
            self.sequencers
                .iter()
                .filter(|s| s.status().sequencer_active == Some(true))
                .collect(),
        )
    }

    /// True iff every member reports a healthy sequencer
    pub fn is_healthy(&self) -> bool {
        !self.sequencers.is_empty()
            && self
                .sequencers
                .iter()
                .all(|s| s.status().sequencer_healthy == Some(true))
    }

    /// True iff every member's last refresh succeeded
    pub fn update_successful(&self) -> bool {
        !self.sequencers.is_empty() && self.sequencers.iter().all(|s| s.update_successful())
    }

    /// True iff every conductor is known to be paused
    ///
    /// A conductor whose state could not be read is not considered paused.
    pub fn all_conductors_paused(&self) -> bool {
        self.sequencers
            .iter()
            .all(|s| s.status().conductor_active == Some(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::tests::{healthy_status, offline_sequencer};
    use crate::sequencer::SequencerStatus;

    fn network_of(statuses: Vec<SequencerStatus>) -> Network {
        let sequencers = statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                let mut s = offline_sequencer(&format!("node-{}", i + 1), true);
                s.apply_status(status);
                s
            })
            .collect();
        Network::new("test", sequencers)
    }

    #[test]
    fn test_healthy_iff_all_members_healthy() {
        let mut network = network_of(vec![
            healthy_status(),
            healthy_status(),
            healthy_status(),
        ]);
        assert!(network.is_healthy());

        let mut unhealthy = healthy_status();
        unhealthy.sequencer_healthy = Some(false);
        network.sequencers_mut()[1].apply_status(unhealthy);
        assert!(!network.is_healthy());

        let mut unknown = healthy_status();
        unknown.sequencer_healthy = None;
        network.sequencers_mut()[1].apply_status(unknown);
        assert!(!network.is_healthy());
    }

    #[test]
    fn test_empty_network_is_not_healthy() {
        let network = Network::new("empty", Vec::new());
        assert!(!network.is_healthy());
        assert!(!network.update_successful());
    }

    #[test]
    fn test_leader_lookup_none_unique_ambiguous() {
        let network = network_of(vec![healthy_status(), healthy_status()]);
        assert!(network.find_conductor_leader().is_none());

        let mut leader = healthy_status();
        leader.conductor_leader = Some(true);
        let network = network_of(vec![healthy_status(), leader.clone(), healthy_status()]);
        let found = network.find_conductor_leader();
        assert_eq!(found.unique().unwrap().sequencer_id, "node-2");

        let network = network_of(vec![leader.clone(), healthy_status(), leader]);
        let found = network.find_conductor_leader();
        assert!(found.is_ambiguous());
        assert_eq!(found.ids(), vec!["node-1", "node-3"]);
        assert!(found.unique().is_none());
        assert!(matches!(
            found.require("leader", "test"),
            Err(OpsError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_active_lookup_ignores_unknown() {
        let mut active = healthy_status();
        active.sequencer_active = Some(true);
        let mut unknown = healthy_status();
        unknown.sequencer_active = None;

        let network = network_of(vec![unknown, active]);
        assert_eq!(
            network.find_active_sequencer().unique().unwrap().sequencer_id,
            "node-2"
        );
    }

    #[test]
    fn test_get_sequencer_by_id() {
        let network = network_of(vec![healthy_status(), healthy_status()]);
        assert!(network.get_sequencer_by_id("node-2").is_some());
        assert!(network.get_sequencer_by_id("node-9").is_none());
        assert!(matches!(
            network.require_sequencer("node-9"),
            Err(OpsError::SequencerNotFound { .. })
        ));
    }

    #[test]
    fn test_all_conductors_paused_requires_known_state() {
        let mut paused = healthy_status();
        paused.conductor_active = Some(false);
        let network = network_of(vec![paused.clone(), paused.clone()]);
        assert!(network.all_conductors_paused());

        let mut unknown = paused.clone();
        unknown.conductor_active = None;
        let network = network_of(vec![paused, unknown]);
        assert!(!network.all_conductors_paused());
    }

    #[tokio::test]
    async fn test_refresh_unreachable_members_degrades_without_error() {
        let mut network = network_of(vec![healthy_status(), healthy_status()]);
        assert!(network.update_successful());

        network.refresh().await;

        assert!(!network.update_successful());
        assert!(!network.is_healthy());
        assert!(network.find_conductor_leader().is_none());
    }
}
