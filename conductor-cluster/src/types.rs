//! Wire types for the conductor and op-node JSON-RPC surfaces

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub id: u64,
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(method: &str, params: Vec<Value>) -> Self {
        Self {
            id: 1,
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC response envelope
///
/// A missing `result` is treated the same as `null`. Any non-null `error`
/// marks the call as failed regardless of the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RpcResponse {
    /// The error payload, if the response carries a non-null one
    pub fn error_payload(&self) -> Option<&Value> {
        self.error.as_ref().filter(|e| !e.is_null())
    }
}

/// Reference to an L2 block as reported by `optimism_syncStatus`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct L2BlockRef {
    pub number: u64,
    pub hash: String,
}

/// Subset of the op-node sync status we care about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub unsafe_l2: L2BlockRef,
}

/// Result of rollup-boost `debug_getExecutionMode`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionModeResponse {
    pub execution_mode: String,
}

/// Raft suffrage of a cluster member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Suffrage {
    Voter,
    Nonvoter,
}

impl Suffrage {
    /// Suffrage a node should hold given its configured voting flag
    pub fn from_voting(voting: bool) -> Self {
        if voting {
            Suffrage::Voter
        } else {
            Suffrage::Nonvoter
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Suffrage::Voter => "voter",
            Suffrage::Nonvoter => "non-voter",
        }
    }
}

impl TryFrom<u8> for Suffrage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Suffrage::Voter),
            1 => Ok(Suffrage::Nonvoter),
            other => Err(format!("unknown suffrage value {}", other)),
        }
    }
}

impl From<Suffrage> for u8 {
    fn from(value: Suffrage) -> Self {
        match value {
            Suffrage::Voter => 0,
            Suffrage::Nonvoter => 1,
        }
    }
}

/// One server entry in the Raft configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub id: String,
    #[serde(default)]
    pub addr: String,
    pub suffrage: Suffrage,
}

/// Result of `conductor_clusterMembership`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClusterMembership {
    #[serde(default)]
    pub servers: Vec<ServerInfo>,
    #[serde(default)]
    pub version: u64,
}

impl ClusterMembership {
    pub fn get(&self, id: &str) -> Option<&ServerInfo> {
        self.servers.iter().find(|s| s.id == id)
    }
}
