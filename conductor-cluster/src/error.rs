//! Error types for fleet operations

use thiserror::Error;

/// Errors that can occur while inspecting or mutating a sequencer cluster
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("Transport error calling {method} on {url}: {reason}")]
    Transport {
        url: String,
        method: String,
        reason: String,
    },

    #[error("HTTP {status} from {url} for {method}")]
    HttpStatus {
        url: String,
        method: String,
        status: u16,
    },

    #[error("RPC {method} returned error: {payload}")]
    Rpc { method: String, payload: String },

    #[error("Invalid response for {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("Network {name} not found, must be one of: {available}")]
    NetworkNotFound { name: String, available: String },

    #[error("Sequencer ID {id} not found in network {network}")]
    SequencerNotFound { id: String, network: String },

    #[error("Could not find current {role} in network {network}")]
    NotFound { role: &'static str, network: String },

    #[error("Ambiguous {role} in network {network}: {} report it", .ids.join(", "))]
    Ambiguous {
        role: &'static str,
        network: String,
        ids: Vec<String>,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{id}: {source}")]
    Node {
        id: String,
        #[source]
        source: Box<OpsError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpsError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            OpsError::Transport { .. } => "transport",
            OpsError::HttpStatus { .. } => "http_status",
            OpsError::Rpc { .. } => "rpc",
            OpsError::InvalidResponse { .. } => "invalid_response",
            OpsError::NetworkNotFound { .. } => "network_not_found",
            OpsError::SequencerNotFound { .. } => "sequencer_not_found",
            OpsError::NotFound { .. } => "not_found",
            OpsError::Ambiguous { .. } => "ambiguous",
            OpsError::Precondition(_) => "precondition",
            OpsError::Timeout(_) => "timeout",
            OpsError::Config(_) => "config",
            OpsError::Node { source, .. } => source.error_type(),
            OpsError::Io(_) => "io",
        }
    }

    /// Attach the identity of the sequencer this error came from
    pub fn for_node(self, id: &str) -> Self {
        match self {
            already @ OpsError::Node { .. } => already,
            other => OpsError::Node {
                id: id.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// True for failures detected before any mutating RPC was issued
    pub fn is_precondition(&self) -> bool {
        match self {
            OpsError::NetworkNotFound { .. }
            | OpsError::SequencerNotFound { .. }
            | OpsError::NotFound { .. }
            | OpsError::Ambiguous { .. }
            | OpsError::Precondition(_) => true,
            OpsError::Node { source, .. } => source.is_precondition(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for OpsError {
    fn from(err: toml::de::Error) -> Self {
        OpsError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_node_wraps_once() {
        let err = OpsError::Rpc {
            method: "conductor_pause".into(),
            payload: "boom".into(),
        }
        .for_node("node-2")
        .for_node("node-3");

        assert_eq!(
            err.to_string(),
            "node-2: RPC conductor_pause returned error: boom"
        );
        assert_eq!(err.error_type(), "rpc");
    }

    #[test]
    fn test_ambiguous_message_lists_ids() {
        let err = OpsError::Ambiguous {
            role: "leader",
            network: "test".into(),
            ids: vec!["node-1".into(), "node-2".into()],
        };
        assert!(err.to_string().contains("node-1, node-2"));
        assert!(err.is_precondition());
    }
}
