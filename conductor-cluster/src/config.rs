//! Fleet configuration
//!
//! ```toml
//! cert_path = "certs/ca.pem"          # optional, relative to this file
//!
//! [sequencers.node-1]
//! raft_addr = "node-1:50050"
//! conductor_rpc_url = "https://node-1-conductor.example"
//! node_rpc_url = "https://node-1-node.example"
//! voting = true
//! builder_rpc_url = "https://node-1-builder.example"          # optional
//! rollup_boost_debug_rpc_url = "https://node-1-boost.example" # optional
//!
//! [networks.mainnet]
//! sequencers = ["node-1", "node-2", "node-3"]
//!
//! [settings]                          # optional, defaults shown
//! rpc_timeout_ms = 10000
//! max_concurrent_refreshes = 16
//! poll_interval_ms = 5000
//! settle_delay_ms = 1000
//! ```

use crate::client::RpcClient;
use crate::error::{OpsError, Result};
use crate::fleet::Fleet;
use crate::network::{Network, DEFAULT_MAX_CONCURRENT_REFRESHES};
use crate::sequencer::Sequencer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FleetConfig {
    /// PEM bundle trusted for HTTPS endpoints
    #[serde(default)]
    pub cert_path: Option<PathBuf>,

    /// Sequencer definitions keyed by sequencer id
    #[serde(default)]
    pub sequencers: BTreeMap<String, SequencerConfig>,

    /// Network definitions keyed by network name
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,

    #[serde(default)]
    pub settings: Settings,
}

/// Endpoints and intended suffrage of one sequencer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SequencerConfig {
    pub raft_addr: String,
    pub conductor_rpc_url: String,
    pub node_rpc_url: String,
    pub voting: bool,

    #[serde(default)]
    pub builder_rpc_url: Option<String>,

    #[serde(default)]
    pub rollup_boost_debug_rpc_url: Option<String>,
}

/// Members of one network, in display order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub sequencers: Vec<String>,
}

/// Tunables shared by every command
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Settings {
    /// Per-request RPC timeout in milliseconds
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_ms: u64,

    /// Bound on members refreshed at the same time
    #[serde(default = "default_max_concurrent_refreshes")]
    pub max_concurrent_refreshes: usize,

    /// Delay between polls while waiting on a condition
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Pause between stopping one sequencer and starting another
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

fn default_rpc_timeout() -> u64 {
    10_000
}

fn default_max_concurrent_refreshes() -> usize {
    DEFAULT_MAX_CONCURRENT_REFRESHES
}

fn default_poll_interval() -> u64 {
    5_000
}

fn default_settle_delay() -> u64 {
    1_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: default_rpc_timeout(),
            max_concurrent_refreshes: default_max_concurrent_refreshes(),
            poll_interval_ms: default_poll_interval(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl Settings {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl FleetConfig {
    /// Read and parse a configuration file
    ///
    /// A relative `cert_path` is resolved against the directory holding the
    /// file. An empty `cert_path` means no extra trust root.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OpsError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let mut config = Self::from_toml_str(&raw)?;

        if let Some(cert) = config.cert_path.take() {
            if cert.is_absolute() {
                config.cert_path = Some(cert);
            } else {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                config.cert_path = Some(base.join(cert));
            }
        }

        debug!(
            path = ?path,
            sequencers = config.sequencers.len(),
            networks = config.networks.len(),
            "Loaded fleet config"
        );
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: FleetConfig = toml::from_str(raw)?;
        if config
            .cert_path
            .as_ref()
            .map_or(false, |p| p.as_os_str().is_empty())
        {
            config.cert_path = None;
        }
        Ok(config)
    }

    /// Reject structurally impossible configurations
    pub fn validate(&self) -> Result<()> {
        let mut owner: HashMap<&str, &str> = HashMap::new();

        for (network, conf) in &self.networks {
            if conf.sequencers.is_empty() {
                return Err(OpsError::Config(format!(
                    "Network {} has no sequencers",
                    network
                )));
            }

            for id in &conf.sequencers {
                if !self.sequencers.contains_key(id) {
                    return Err(OpsError::Config(format!(
                        "Network {} references unknown sequencer {}",
                        network, id
                    )));
                }
                if let Some(previous) = owner.insert(id.as_str(), network.as_str()) {
                    let reason = if previous == network {
                        format!("Sequencer {} listed twice in network {}", id, network)
                    } else {
                        format!(
                            "Sequencer {} belongs to both {} and {}",
                            id, previous, network
                        )
                    };
                    return Err(OpsError::Config(reason));
                }
            }
        }

        if self.settings.max_concurrent_refreshes == 0 {
            return Err(OpsError::Config(
                "settings.max_concurrent_refreshes must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and build the in-memory fleet
    ///
    /// `cert_override` takes precedence over `cert_path` from the file.
    pub fn build_fleet(&self, cert_override: Option<&Path>) -> Result<Fleet> {
        self.validate()?;

        let cert = cert_override.or(self.cert_path.as_deref());
        let client = RpcClient::new(self.settings.rpc_timeout(), cert)?;

        let networks = self
            .networks
            .iter()
            .map(|(name, conf)| {
                let sequencers = conf
                    .sequencers
                    .iter()
                    .filter_map(|id| {
                        self.sequencers
                            .get(id)
                            .map(|seq| build_sequencer(id, seq, client.clone()))
                    })
                    .collect();
                Network::new(name.clone(), sequencers)
                    .with_max_concurrent_refreshes(self.settings.max_concurrent_refreshes)
            })
            .collect();

        Ok(Fleet::new(networks))
    }
}

fn build_sequencer(id: &str, conf: &SequencerConfig, client: RpcClient) -> Sequencer {
    let mut sequencer = Sequencer::new(
        id,
        conf.raft_addr.clone(),
        conf.conductor_rpc_url.clone(),
        conf.node_rpc_url.clone(),
        conf.voting,
        client,
    );
    if let Some(url) = conf.builder_rpc_url.as_deref().filter(|u| !u.is_empty()) {
        sequencer = sequencer.with_builder(url);
    }
    if let Some(url) = conf
        .rollup_boost_debug_rpc_url
        .as_deref()
        .filter(|u| !u.is_empty())
    {
        sequencer = sequencer.with_rollup_boost(url);
    }
    sequencer
}
