//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PedigreeConfig {
    /// Registry contract settings.
    pub registry: RegistryConfig,

    /// Local signer settings.
    pub wallet: WalletConfig,

    /// Networks the wallet can switch between.
    pub networks: Vec<NetworkConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl PedigreeConfig {
    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|network| network.chain_id == chain_id)
    }

    /// Configured networks, or the local development node when none are listed.
    pub fn effective_networks(&self) -> Vec<NetworkConfig> {
        if self.networks.is_empty() {
            vec![NetworkConfig::default()]
        } else {
            self.networks.clone()
        }
    }
}

/// Registry contract settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Deployed `PedigreePal` contract address.
    pub contract_address: String,

    /// Chain the contract is deployed on (31337 for a local Hardhat node).
    pub required_chain_id: u64,

    /// Delay between receipt polls in milliseconds.
    pub confirmation_poll_ms: u64,

    /// Reject self-referencing or unknown parents before submitting.
    pub validate_pedigree: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            // First deployment on a fresh Hardhat node.
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            required_chain_id: 31337,
            confirmation_poll_ms: 1000,
            validate_pedigree: true,
        }
    }
}

/// Local signer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding comma-separated private keys.
    pub private_key_env: String,

    /// Chain the wallet starts on; the first network when unset.
    pub initial_chain_id: Option<u64>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "PEDIGREE_PRIVATE_KEY".to_string(),
            initial_chain_id: None,
        }
    }
}

/// A JSON-RPC network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            name: "hardhat".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: PedigreeConfig = toml::from_str("").unwrap();
        assert_eq!(config.registry.required_chain_id, 31337);
        assert!(config.registry.validate_pedigree);
        assert_eq!(config.wallet.private_key_env, "PEDIGREE_PRIVATE_KEY");
        assert_eq!(config.effective_networks(), vec![NetworkConfig::default()]);
    }

    #[test]
    fn test_networks_table() {
        let config: PedigreeConfig = toml::from_str(
            r#"
            [registry]
            required_chain_id = 11155111

            [[networks]]
            chain_id = 11155111
            name = "sepolia"
            rpc_url = "https://sepolia.example.org"

            [[networks]]
            chain_id = 31337
            rpc_url = "http://localhost:8545"
            "#,
        )
        .unwrap();
        assert_eq!(config.networks.len(), 2);
        assert_eq!(config.network(11155111).unwrap().name, "sepolia");
        assert_eq!(config.network(31337).unwrap().name, "");
        assert!(config.network(1).is_none());
        // Sections left out keep their defaults.
        assert_eq!(config.registry.confirmation_poll_ms, 1000);
    }
}
