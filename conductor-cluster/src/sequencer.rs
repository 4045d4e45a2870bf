//! A single sequencer node and its last observed status
//!
//! ```text
//! refresh():
//!   conductor_active ─┐
//!   conductor_leader ─┤
//!   sequencer_healthy ┤
//!   sequencer_active ─┼─ join ─→ SequencerStatus (None = probe failed)
//!   unsafe_l2 ────────┤
//!   builder unsafe_l2 ┤  (only with a builder endpoint)
//!   execution_mode ───┘  (only with a rollup-boost endpoint)
//! ```

use crate::client::RpcClient;
use crate::error::{OpsError, Result};
use crate::types::{ClusterMembership, ExecutionModeResponse, L2BlockRef, SyncStatus};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Snapshot of the probes polled on every refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerStatus {
    pub conductor_active: Option<bool>,
    pub conductor_leader: Option<bool>,
    pub sequencer_healthy: Option<bool>,
    pub sequencer_active: Option<bool>,
    pub unsafe_l2: Option<L2BlockRef>,
}

impl SequencerStatus {
    /// True when every core probe produced a value
    pub fn is_complete(&self) -> bool {
        self.conductor_active.is_some()
            && self.conductor_leader.is_some()
            && self.sequencer_healthy.is_some()
            && self.sequencer_active.is_some()
            && self.unsafe_l2.is_some()
    }
}

/// Block builder sitting next to the sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderEndpoint {
    pub rpc_url: String,
    pub unsafe_l2: Option<L2BlockRef>,
}

/// rollup-boost sidecar exposing its debug API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupBoostEndpoint {
    pub rpc_url: String,
    pub execution_mode: Option<String>,
}

/// Optional endpoints a sequencer may be deployed with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerExtensions {
    pub builder: Option<BuilderEndpoint>,
    pub rollup_boost: Option<RollupBoostEndpoint>,
}

impl SequencerExtensions {
    fn is_complete(&self) -> bool {
        let builder_ok = self
            .builder
            .as_ref()
            .map_or(true, |b| b.unsafe_l2.is_some());
        let rollup_boost_ok = self
            .rollup_boost
            .as_ref()
            .map_or(true, |r| r.execution_mode.is_some());
        builder_ok && rollup_boost_ok
    }

    #[cfg(test)]
    fn clear_observations(&mut self) {
        if let Some(builder) = self.builder.as_mut() {
            builder.unsafe_l2 = None;
        }
        if let Some(rollup_boost) = self.rollup_boost.as_mut() {
            rollup_boost.execution_mode = None;
        }
    }
}

/// One member of a sequencer cluster
#[derive(Debug, Clone)]
pub struct Sequencer {
    pub sequencer_id: String,
    pub raft_addr: String,
    pub conductor_rpc_url: String,
    pub node_rpc_url: String,
    /// Whether this node should hold Raft suffrage
    pub voting: bool,
    extensions: SequencerExtensions,
    status: SequencerStatus,
    update_successful: bool,
    client: RpcClient,
}

impl Sequencer {
    pub fn new(
        sequencer_id: impl Into<String>,
        raft_addr: impl Into<String>,
        conductor_rpc_url: impl Into<String>,
        node_rpc_url: impl Into<String>,
        voting: bool,
        client: RpcClient,
    ) -> Self {
        Self {
            sequencer_id: sequencer_id.into(),
            raft_addr: raft_addr.into(),
            conductor_rpc_url: conductor_rpc_url.into(),
            node_rpc_url: node_rpc_url.into(),
            voting,
            extensions: SequencerExtensions::default(),
            status: SequencerStatus::default(),
            update_successful: false,
            client,
        }
    }

    #[must_use]
    pub fn with_builder(mut self, rpc_url: impl Into<String>) -> Self {
        self.extensions.builder = Some(BuilderEndpoint {
            rpc_url: rpc_url.into(),
            unsafe_l2: None,
        });
        self
    }

    #[must_use]
    pub fn with_rollup_boost(mut self, rpc_url: impl Into<String>) -> Self {
        self.extensions.rollup_boost = Some(RollupBoostEndpoint {
            rpc_url: rpc_url.into(),
            execution_mode: None,
        });
        self
    }

    pub fn status(&self) -> &SequencerStatus {
        &self.status
    }

    pub fn extensions(&self) -> &SequencerExtensions {
        &self.extensions
    }

    pub fn builder(&self) -> Option<&BuilderEndpoint> {
        self.extensions.builder.as_ref()
    }

    pub fn rollup_boost(&self) -> Option<&RollupBoostEndpoint> {
        self.extensions.rollup_boost.as_ref()
    }

    /// True only if every probe of the last refresh succeeded
    pub fn update_successful(&self) -> bool {
        self.update_successful
    }

    /// Replace the observed snapshot wholesale
    ///
    /// Extension observations are cleared; `update_successful` is derived
    /// from completeness of the new snapshot.
    #[cfg(test)]
    pub(crate) fn apply_status(&mut self, status: SequencerStatus) {
        self.extensions.clear_observations();
        self.update_successful = status.is_complete() && self.extensions.is_complete();
        self.status = status;
    }

    /// Poll all probes concurrently and overwrite the snapshot
    ///
    /// Probe failures never propagate; the affected field becomes `None`.
    pub async fn refresh(&mut self) {
        let (
            conductor_active,
            conductor_leader,
            sequencer_healthy,
            sequencer_active,
            unsafe_l2,
            builder_unsafe_l2,
            execution_mode,
        ) = tokio::join!(
            self.probe::<bool>(&self.conductor_rpc_url, "conductor_active"),
            self.probe::<bool>(&self.conductor_rpc_url, "conductor_leader"),
            self.probe::<bool>(&self.conductor_rpc_url, "conductor_sequencerHealthy"),
            self.probe::<bool>(&self.node_rpc_url, "admin_sequencerActive"),
            self.probe_unsafe_l2(&self.node_rpc_url),
            self.probe_builder(),
            self.probe_execution_mode(),
        );

        self.status = SequencerStatus {
            conductor_active,
            conductor_leader,
            sequencer_healthy,
            sequencer_active,
            unsafe_l2,
        };
        if let Some(builder) = self.extensions.builder.as_mut() {
            builder.unsafe_l2 = builder_unsafe_l2.flatten();
        }
        if let Some(rollup_boost) = self.extensions.rollup_boost.as_mut() {
            rollup_boost.execution_mode = execution_mode.flatten();
        }
        self.update_successful = self.status.is_complete() && self.extensions.is_complete();

        debug!(
            sequencer = %self.sequencer_id,
            update_successful = self.update_successful,
            status = ?self.status,
            "Refreshed sequencer"
        );
    }

    async fn probe<T: DeserializeOwned>(&self, url: &str, method: &str) -> Option<T> {
        let result = self
            .client
            .call(&self.sequencer_id, url, method, Vec::new())
            .await;
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    sequencer = %self.sequencer_id,
                    method = %method,
                    error = %e,
                    "Probe failed"
                );
                None
            }
        }
    }

    async fn probe_unsafe_l2(&self, url: &str) -> Option<L2BlockRef> {
        self.probe::<SyncStatus>(url, "optimism_syncStatus")
            .await
            .map(|s| s.unsafe_l2)
    }

    /// Outer `None` means no builder is configured
    async fn probe_builder(&self) -> Option<Option<L2BlockRef>> {
        let builder = self.extensions.builder.as_ref()?;
        let unsafe_l2 = self.probe_unsafe_l2(&builder.rpc_url).await;
        if let Some(head) = &unsafe_l2 {
            debug!(
                sequencer = %self.sequencer_id,
                number = head.number,
                "Builder unsafe head"
            );
        }
        Some(unsafe_l2)
    }

    /// Outer `None` means no rollup-boost endpoint is configured
    async fn probe_execution_mode(&self) -> Option<Option<String>> {
        let rollup_boost = self.extensions.rollup_boost.as_ref()?;
        Some(
            self.probe::<ExecutionModeResponse>(&rollup_boost.rpc_url, "debug_getExecutionMode")
                .await
                .map(|r| r.execution_mode),
        )
    }

    /// Issue a mutating call and tag any failure with this sequencer's id
    async fn execute(&self, url: &str, method: &str, params: Vec<Value>) -> Result<Value> {
        self.client
            .call::<Value>(&self.sequencer_id, url, method, params)
            .await
            .map_err(|e| e.for_node(&self.sequencer_id))
    }

    // ========================================
    // Conductor RPCs
    // ========================================

    /// Fetch the Raft configuration as seen by this conductor
    pub async fn cluster_membership(&self) -> Result<ClusterMembership> {
        self.client
            .call(
                &self.sequencer_id,
                &self.conductor_rpc_url,
                "conductor_clusterMembership",
                Vec::new(),
            )
            .await
            .map_err(|e| e.for_node(&self.sequencer_id))
    }

    pub async fn pause_conductor(&self) -> Result<()> {
        self.execute(&self.conductor_rpc_url, "conductor_pause", Vec::new())
            .await?;
        info!(sequencer = %self.sequencer_id, "Paused conductor");
        Ok(())
    }

    pub async fn resume_conductor(&self) -> Result<()> {
        self.execute(&self.conductor_rpc_url, "conductor_resume", Vec::new())
            .await?;
        info!(sequencer = %self.sequencer_id, "Resumed conductor");
        Ok(())
    }

    /// Force the conductor to report itself as leader (or stop doing so)
    pub async fn override_conductor_leader(&self, enabled: bool) -> Result<()> {
        self.execute(
            &self.conductor_rpc_url,
            "conductor_overrideLeader",
            vec![json!(enabled)],
        )
        .await?;
        Ok(())
    }

    /// Ask this conductor (expected to be leader) to hand leadership to `target`
    pub async fn transfer_leader_to(&self, target: &Sequencer) -> Result<()> {
        self.execute(
            &self.conductor_rpc_url,
            "conductor_transferLeaderToServer",
            vec![json!(target.sequencer_id), json!(target.raft_addr)],
        )
        .await?;
        Ok(())
    }

    pub async fn remove_server(&self, server_id: &str) -> Result<()> {
        self.execute(
            &self.conductor_rpc_url,
            "conductor_removeServer",
            vec![json!(server_id), json!(0)],
        )
        .await?;
        Ok(())
    }

    /// Add `member` to the Raft group with the suffrage its config asks for
    pub async fn add_server(&self, member: &Sequencer) -> Result<()> {
        let method = if member.voting {
            "conductor_addServerAsVoter"
        } else {
            "conductor_addServerAsNonvoter"
        };
        self.execute(
            &self.conductor_rpc_url,
            method,
            vec![json!(member.sequencer_id), json!(member.raft_addr), json!(0)],
        )
        .await?;
        Ok(())
    }

    // ========================================
    // op-node admin RPCs
    // ========================================

    pub async fn admin_override_leader(&self) -> Result<()> {
        self.execute(&self.node_rpc_url, "admin_overrideLeader", Vec::new())
            .await?;
        Ok(())
    }

    /// Stop sequencing; returns the hash of the last sequenced block
    pub async fn stop_sequencer(&self) -> Result<String> {
        let result = self
            .execute(&self.node_rpc_url, "admin_stopSequencer", Vec::new())
            .await?;
        match result {
            Value::String(hash) => Ok(hash),
            Value::Null => Ok(String::new()),
            other => Err(OpsError::InvalidResponse {
                method: "admin_stopSequencer".to_string(),
                reason: format!("expected block hash, got {}", other),
            }
            .for_node(&self.sequencer_id)),
        }
    }

    pub async fn start_sequencer(&self, hash: &str) -> Result<()> {
        self.execute(
            &self.node_rpc_url,
            "admin_startSequencer",
            vec![json!(hash)],
        )
        .await?;
        Ok(())
    }
}
