use std::path::{Path, PathBuf};

use anyhow::Context;
use ethers_core::types::Address;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Endpoint used when no provider is configured.
pub const FALLBACK_RPC_URL: &str = "http://localhost:7545";

/// Interface description loaded when none is configured.
pub const DEFAULT_ARTIFACT_PATH: &str = "Election.json";

/// Where the client finds its provider and signing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// JSON-RPC endpoint. When absent, [`FALLBACK_RPC_URL`] is used.
    pub rpc_url: Option<String>,
    /// Hex encoded private key file. When present, transactions are signed locally.
    pub wallet_key_path: Option<PathBuf>,
    /// Chain id for local signing. Queried from the provider when absent.
    pub chain_id: Option<u64>,
    /// Event polling interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
}

/// Which contract to bind to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractConfig {
    /// Bare ABI or Truffle build artifact.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// Deployed address. Looked up in the artifact's `networks` when absent.
    pub address: Option<Address>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            address: None,
        }
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

/// Client Configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Contract configuration.
    #[serde(default)]
    pub contract: ContractConfig,
}

/// Reads a TOML file into `R`.
pub fn from_toml_path<P: AsRef<Path>, R: DeserializeOwned>(path: P) -> anyhow::Result<R> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Unable to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Invalid TOML in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::str::FromStr;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_config_from(content: &str) -> NamedTempFile {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file.write_all(content.as_bytes()).unwrap();
        config_file
    }

    #[test]
    fn test_correct_config() {
        let config = r#"
            [provider]
            rpc_url = "http://localhost:8545"
            wallet_key_path = "/tmp/key.hex"
            chain_id = 1337
            poll_interval_ms = 250
            [contract]
            artifact_path = "build/contracts/Election.json"
            address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        "#;

        let config_file = create_config_from(config);

        let config: ClientConfig = from_toml_path(config_file.path()).unwrap();
        let expected = ClientConfig {
            provider: ProviderConfig {
                rpc_url: Some("http://localhost:8545".to_string()),
                wallet_key_path: Some(PathBuf::from("/tmp/key.hex")),
                chain_id: Some(1337),
                poll_interval_ms: Some(250),
            },
            contract: ContractConfig {
                artifact_path: PathBuf::from("build/contracts/Election.json"),
                address: Some(
                    Address::from_str("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap(),
                ),
            },
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_empty_config_uses_fallbacks() {
        let config_file = create_config_from("");

        let config: ClientConfig = from_toml_path(config_file.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(
            config.contract.artifact_path,
            PathBuf::from(DEFAULT_ARTIFACT_PATH)
        );
        assert!(config.provider.rpc_url.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result: anyhow::Result<ClientConfig> = from_toml_path("/nonexistent/election.toml");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/election.toml"));
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let config_file = create_config_from("[provider\nrpc_url = 1");

        let err = from_toml_path::<_, ClientConfig>(config_file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid TOML in"));
        assert!(err
            .to_string()
            .contains(&config_file.path().display().to_string()));
    }
}
