//! JSON-RPC client for conductor, op-node, builder and rollup-boost endpoints
//!
//! One `reqwest::Client` is built per process and cloned into every
//! sequencer; clones share the underlying connection pool.

use crate::error::{OpsError, Result};
use crate::metrics::RpcTimer;
use crate::types::{RpcRequest, RpcResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Read-only RPC client shared by all probes and commands
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl RpcClient {
    /// Create a client with the given request timeout
    ///
    /// When `cert_path` is set, the PEM bundle at that path is added as a
    /// trusted root for every outbound HTTPS request.
    pub fn new(timeout: Duration, cert_path: Option<&Path>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);

        if let Some(path) = cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                OpsError::Config(format!("Failed to read certificate {:?}: {}", path, e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                OpsError::Config(format!("Invalid certificate {:?}: {}", path, e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| OpsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Call `method` on `url` and decode the `result` member into `T`
    ///
    /// Metrics for the call are attributed to `sequencer_id`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        sequencer_id: &str,
        url: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T> {
        let timer = RpcTimer::start(sequencer_id, method);
        let result = self.send(url, method, params).await;
        timer.finish(&result);
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T> {
        let request = RpcRequest::new(method, params);
        debug!(url = %url, method = %method, "Sending RPC request");

        let resp = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OpsError::Transport {
                url: url.to_string(),
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OpsError::HttpStatus {
                url: url.to_string(),
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let body: RpcResponse = resp.json().await.map_err(|e| OpsError::InvalidResponse {
            method: method.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(payload) = body.error_payload() {
            return Err(OpsError::Rpc {
                method: method.to_string(),
                payload: payload.to_string(),
            });
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null)).map_err(|e| {
            OpsError::InvalidResponse {
                method: method.to_string(),
                reason: e.to_string(),
            }
        })
    }
}
