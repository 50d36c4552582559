use std::collections::BTreeMap;
use std::path::Path;

use ethers_core::abi::Abi;
use ethers_core::types::Address;
use serde::Deserialize;

use crate::events::EventKind;
use crate::ClientError;

/// Functions the client calls.
pub const REQUIRED_FUNCTIONS: [&str; 8] = [
    "candidatesCount",
    "candidates",
    "voters",
    "vote",
    "registerVoter",
    "removeCandidate",
    "endElection",
    "resetElection",
];

/// Where a build artifact was deployed on one network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Deployment {
    /// Contract address on that network.
    pub address: Address,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactFile {
    Truffle {
        abi: Abi,
        #[serde(default)]
        networks: BTreeMap<String, Deployment>,
    },
    Bare(Abi),
}

/// A validated contract interface description.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    abi: Abi,
    networks: BTreeMap<String, Deployment>,
}

impl ContractArtifact {
    /// Loads a bare ABI array or a Truffle build artifact from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ClientError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parses and validates an interface description.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let artifact = match serde_json::from_str::<ArtifactFile>(json) {
            Ok(ArtifactFile::Truffle { abi, networks }) => Self { abi, networks },
            Ok(ArtifactFile::Bare(abi)) => Self {
                abi,
                networks: BTreeMap::new(),
            },
            // Re-parse as a bare ABI so the error points at the actual problem
            // instead of serde's untagged-enum message.
            Err(_) => Self {
                abi: serde_json::from_str(json)?,
                networks: BTreeMap::new(),
            },
        };
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ClientError> {
        for name in REQUIRED_FUNCTIONS {
            if self.abi.function(name).is_err() {
                return Err(ClientError::MissingAbiItem {
                    kind: "function",
                    name,
                });
            }
        }
        for kind in EventKind::ALL {
            if self.abi.event(kind.abi_name()).is_err() {
                return Err(ClientError::MissingAbiItem {
                    kind: "event",
                    name: kind.abi_name(),
                });
            }
        }
        Ok(())
    }

    /// The contract ABI.
    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// Resolves the contract address, preferring `configured` over the artifact's deployments.
    pub fn resolve_address(
        &self,
        configured: Option<Address>,
        network_id: &str,
    ) -> Result<Address, ClientError> {
        if let Some(address) = configured {
            return Ok(address);
        }
        self.networks
            .get(network_id)
            .map(|deployment| deployment.address)
            .ok_or_else(|| ClientError::UnknownDeployment {
                network_id: network_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::str::FromStr;

    use super::*;

    fn test_data_path() -> PathBuf {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("test-data");
        path
    }

    #[test]
    fn loads_truffle_artifact() {
        let artifact = ContractArtifact::load(test_data_path().join("Election.json")).unwrap();
        assert!(artifact.abi().function("vote").is_ok());

        let deployed = artifact.resolve_address(None, "5777").unwrap();
        assert_eq!(
            deployed,
            Address::from_str("0x9FBDa871d559710256a2502A2517b794B482Db40").unwrap()
        );
    }

    #[test]
    fn configured_address_wins() {
        let artifact = ContractArtifact::load(test_data_path().join("Election.json")).unwrap();
        let configured = Address::repeat_byte(0x42);
        assert_eq!(
            artifact.resolve_address(Some(configured), "5777").unwrap(),
            configured
        );
    }

    #[test]
    fn unknown_network_is_an_error() {
        let artifact = ContractArtifact::load(test_data_path().join("Election.json")).unwrap();
        let err = artifact.resolve_address(None, "1").unwrap_err();
        assert!(matches!(err, ClientError::UnknownDeployment { network_id } if network_id == "1"));
    }

    #[test]
    fn loads_bare_abi() {
        let json = std::fs::read_to_string(test_data_path().join("Election.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let bare = serde_json::to_string(&value["abi"]).unwrap();

        let artifact = ContractArtifact::from_json(&bare).unwrap();
        assert!(artifact.resolve_address(None, "5777").is_err());
    }

    #[test]
    fn missing_function_is_reported() {
        let json = r#"[
            {"type":"function","name":"candidatesCount","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}
        ]"#;
        let err = ContractArtifact::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingAbiItem {
                kind: "function",
                name: "candidates"
            }
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ContractArtifact::load(test_data_path().join("Missing.json")).unwrap_err();
        assert!(matches!(err, ClientError::ArtifactRead { .. }));
    }

    #[test]
    fn garbage_is_reported() {
        let err = ContractArtifact::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ClientError::ArtifactParse(_)));
    }
}
