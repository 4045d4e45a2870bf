//! All configured networks, looked up by name

use crate::error::{OpsError, Result};
use crate::network::Network;
use std::collections::BTreeMap;

/// The set of networks a single invocation can act on
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    networks: BTreeMap<String, Network>,
}

impl Fleet {
    pub fn new(networks: Vec<Network>) -> Self {
        Self {
            networks: networks
                .into_iter()
                .map(|n| (n.name().to_string(), n))
                .collect(),
        }
    }

    /// Network names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }

    pub fn network(&self, name: &str) -> Result<&Network> {
        match self.networks.get(name) {
            Some(network) => Ok(network),
            None => Err(self.not_found(name)),
        }
    }

    pub fn network_mut(&mut self, name: &str) -> Result<&mut Network> {
        let available = self.names().join(", ");
        self.networks
            .get_mut(name)
            .ok_or_else(|| OpsError::NetworkNotFound {
                name: name.to_string(),
                available,
            })
    }

    fn not_found(&self, name: &str) -> OpsError {
        OpsError::NetworkNotFound {
            name: name.to_string(),
            available: self.names().join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_network_lists_valid_names() {
        let mut fleet = Fleet::new(vec![
            Network::new("sepolia", Vec::new()),
            Network::new("mainnet", Vec::new()),
        ]);

        assert_eq!(fleet.names(), vec!["mainnet", "sepolia"]);
        assert!(fleet.network("mainnet").is_ok());

        let err = fleet.network_mut("devnet").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Network devnet not found, must be one of: mainnet, sepolia"
        );
    }
}
