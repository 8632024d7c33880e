//! Engine-wide tuning loaded from a TOML file (spec §6: "no CLI, no
//! on-disk persisted swap state, no environment variables" — this
//! holds configuration only, never an in-flight swap's state).

use std::path::Path;

use eyre::{eyre, Result};
use serde::Deserialize;

use crate::network::Network;

/// Top-level engine configuration, mirroring the shape of the
/// reference wallet's TOML configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: NetworkName,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    Mainnet,
    Testnet,
}

impl From<NetworkName> for Network {
    fn from(name: NetworkName) -> Self {
        match name {
            NetworkName::Mainnet => Network::Mainnet,
            NetworkName::Testnet => Network::Testnet,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_confidence_threshold")]
    pub threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self { threshold: default_confidence_threshold() }
    }
}

fn default_confidence_threshold() -> f64 {
    0.95
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(eyre!("engine configuration file not found: {}", path.display()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn network(&self) -> Network {
        self.network.name.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_testnet_config() {
        let toml = r#"
            [network]
            name = "testnet"
        "#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.network(), Network::Testnet);
        assert_eq!(config.confidence.threshold, 0.95);
    }

    #[test]
    fn confidence_threshold_is_overridable() {
        let toml = r#"
            [network]
            name = "mainnet"

            [confidence]
            threshold = 0.8
        "#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.network(), Network::Mainnet);
        assert_eq!(config.confidence.threshold, 0.8);
    }
}
