//! Fake conductor / op-node JSON-RPC endpoints served by a real Axum server.
//!
//! Every node is reachable under `/{node}/conductor` and `/{node}/node`, and
//! under `/{node}/builder` and `/{node}/boost` when it has extensions.
//! Calls are recorded so tests can assert which mutating RPCs were sent.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use conductor_cluster::{AutoConfirm, Confirm, FleetConfig, OpsContext, Timing};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub voting: bool,
    pub conductor_active: bool,
    pub leader: bool,
    pub healthy: bool,
    pub sequencer_active: bool,
    pub unsafe_hash: String,
    /// Methods that answer with a JSON-RPC error
    pub failing: HashSet<String>,
    /// Configure builder and rollup-boost endpoints for this node
    pub extensions: bool,
    pub execution_mode: String,
    /// Not healed by `admin_startSequencer`
    pub stays_unhealthy: bool,
}

impl FakeNode {
    pub fn follower() -> Self {
        Self {
            voting: true,
            conductor_active: true,
            leader: false,
            healthy: true,
            sequencer_active: false,
            unsafe_hash: "0xfollower".to_string(),
            failing: HashSet::new(),
            extensions: false,
            execution_mode: "enabled".to_string(),
            stays_unhealthy: false,
        }
    }

    pub fn leader() -> Self {
        Self {
            leader: true,
            sequencer_active: true,
            unsafe_hash: "0xleader".to_string(),
            ..Self::follower()
        }
    }

    pub fn failing(mut self, method: &str) -> Self {
        self.failing.insert(method.to_string());
        self
    }

    pub fn with_extensions(mut self) -> Self {
        self.extensions = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub node: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Default)]
pub struct FakeCluster {
    pub nodes: BTreeMap<String, FakeNode>,
    /// (id, addr, suffrage) as the Raft leader reports it
    pub raft: Vec<(String, String, u8)>,
    pub calls: Vec<RecordedCall>,
}

pub type Shared = Arc<Mutex<FakeCluster>>;

impl FakeCluster {
    /// Nodes in order, with a Raft group that matches their voting flags
    pub fn with_nodes(nodes: Vec<(&str, FakeNode)>) -> Self {
        let raft = nodes
            .iter()
            .map(|(id, n)| {
                let suffrage = if n.voting { 0 } else { 1 };
                (id.to_string(), raft_addr(id), suffrage)
            })
            .collect();
        Self {
            nodes: nodes.into_iter().map(|(id, n)| (id.to_string(), n)).collect(),
            raft,
            calls: Vec::new(),
        }
    }
}

pub fn raft_addr(id: &str) -> String {
    format!("{}:50050", id)
}

const READ_ONLY: &[&str] = &[
    "conductor_active",
    "conductor_leader",
    "conductor_sequencerHealthy",
    "admin_sequencerActive",
    "optimism_syncStatus",
    "conductor_clusterMembership",
    "debug_getExecutionMode",
];

/// Mutating calls recorded so far, in order
pub fn mutations(cluster: &Shared) -> Vec<RecordedCall> {
    cluster
        .lock()
        .unwrap()
        .calls
        .iter()
        .filter(|c| !READ_ONLY.contains(&c.method.as_str()))
        .cloned()
        .collect()
}

pub fn calls_of(cluster: &Shared, method: &str) -> Vec<RecordedCall> {
    cluster
        .lock()
        .unwrap()
        .calls
        .iter()
        .filter(|c| c.method == method)
        .cloned()
        .collect()
}

async fn handle(
    State(cluster): State<Shared>,
    Path((node, _kind)): Path<(String, String)>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();

    let mut guard = cluster.lock().unwrap();
    guard.calls.push(RecordedCall {
        node: node.clone(),
        method: method.clone(),
        params: params.clone(),
    });

    let failing = guard
        .nodes
        .get(&node)
        .map_or(true, |n| n.failing.contains(&method));
    if failing {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "injected failure"}
        }));
    }

    let result = dispatch(&mut guard, &node, &method, &params);
    Json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn dispatch(cluster: &mut FakeCluster, node: &str, method: &str, params: &Value) -> Value {
    let current = cluster.nodes[node].clone();
    match method {
        "conductor_active" => json!(current.conductor_active),
        "conductor_leader" => json!(current.leader),
        "conductor_sequencerHealthy" => json!(current.healthy),
        "admin_sequencerActive" => json!(current.sequencer_active),
        "optimism_syncStatus" => json!({
            "unsafe_l2": {"number": 100, "hash": current.unsafe_hash}
        }),
        "debug_getExecutionMode" => json!({"execution_mode": current.execution_mode}),
        "conductor_clusterMembership" => {
            let servers: Vec<Value> = cluster
                .raft
                .iter()
                .map(|(id, addr, suffrage)| {
                    json!({"id": id, "addr": addr, "suffrage": suffrage})
                })
                .collect();
            json!({"servers": servers, "version": 1})
        }
        "conductor_pause" => {
            set(cluster, node, |n| n.conductor_active = false);
            Value::Null
        }
        "conductor_resume" => {
            set(cluster, node, |n| n.conductor_active = true);
            Value::Null
        }
        "conductor_transferLeaderToServer" => {
            let target = params[0].as_str().unwrap_or_default().to_string();
            for (id, n) in cluster.nodes.iter_mut() {
                n.leader = *id == target;
            }
            Value::Null
        }
        "conductor_removeServer" => {
            let id = params[0].as_str().unwrap_or_default().to_string();
            cluster.raft.retain(|(raft_id, _, _)| *raft_id != id);
            Value::Null
        }
        "conductor_addServerAsVoter" | "conductor_addServerAsNonvoter" => {
            let id = params[0].as_str().unwrap_or_default().to_string();
            let addr = params[1].as_str().unwrap_or_default().to_string();
            let suffrage = if method == "conductor_addServerAsVoter" { 0 } else { 1 };
            if !cluster.raft.iter().any(|(raft_id, _, _)| *raft_id == id) {
                cluster.raft.push((id, addr, suffrage));
            }
            Value::Null
        }
        "admin_stopSequencer" => {
            set(cluster, node, |n| n.sequencer_active = false);
            json!(current.unsafe_hash)
        }
        "admin_startSequencer" => {
            set(cluster, node, |n| n.sequencer_active = true);
            for n in cluster.nodes.values_mut() {
                n.healthy = !n.stays_unhealthy;
            }
            Value::Null
        }
        _ => Value::Null,
    }
}

fn set(cluster: &mut FakeCluster, node: &str, update: impl FnOnce(&mut FakeNode)) {
    if let Some(n) = cluster.nodes.get_mut(node) {
        update(n);
    }
}

/// Start the fake endpoints on a random port and return the base URL
pub async fn start_fake(cluster: FakeCluster) -> (Shared, String, tokio::task::JoinHandle<()>) {
    let shared: Shared = Arc::new(Mutex::new(cluster));
    let router = Router::new()
        .route("/:node/:kind", post(handle))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (shared, base_url, handle)
}

/// Config text for a network named `testnet` pointing at the fake endpoints
pub fn config_toml(base_url: &str, cluster: &Shared) -> String {
    let guard = cluster.lock().unwrap();
    let mut out = String::new();
    for (id, node) in &guard.nodes {
        let endpoint = |kind: &str| format!("\"{}/{}/{}\"", base_url, id, kind);
        out.push_str(&format!("[sequencers.{}]\n", id));
        out.push_str(&format!("raft_addr = \"{}\"\n", raft_addr(id)));
        out.push_str(&format!("conductor_rpc_url = {}\n", endpoint("conductor")));
        out.push_str(&format!("node_rpc_url = {}\n", endpoint("node")));
        out.push_str(&format!("voting = {}\n", node.voting));
        if node.extensions {
            out.push_str(&format!("builder_rpc_url = {}\n", endpoint("builder")));
            out.push_str(&format!("rollup_boost_debug_rpc_url = {}\n", endpoint("boost")));
        }
        out.push('\n');
    }
    let ids: Vec<String> = guard.nodes.keys().map(|id| format!("\"{}\"", id)).collect();
    out.push_str(&format!("[networks.testnet]\nsequencers = [{}]\n", ids.join(", ")));
    out.push_str("\n[settings]\n");
    out.push_str("rpc_timeout_ms = 2000\npoll_interval_ms = 10\nsettle_delay_ms = 0\n");
    out
}

pub fn context(base_url: &str, cluster: &Shared, confirm: Box<dyn Confirm>) -> OpsContext {
    let config = FleetConfig::from_toml_str(&config_toml(base_url, cluster)).unwrap();
    let fleet = config.build_fleet(None).unwrap();
    OpsContext::new(fleet, confirm).with_timing(Timing::from(&config.settings))
}

pub fn auto_context(base_url: &str, cluster: &Shared) -> OpsContext {
    context(base_url, cluster, Box::new(AutoConfirm))
}

/// Declines every prompt and counts how often it was asked
pub struct Decline(pub Arc<Mutex<u32>>);

impl Confirm for Decline {
    fn confirm(&self, _prompt: &str) -> conductor_cluster::Result<bool> {
        *self.0.lock().unwrap() += 1;
        Ok(false)
    }
}
