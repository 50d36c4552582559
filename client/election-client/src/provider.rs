use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::Address;
use ethers_middleware::SignerMiddleware;
use ethers_providers::{Http, Middleware, Provider};
use ethers_signers::{LocalWallet, Signer};
use tracing::{info, warn};

use crate::config::{ProviderConfig, FALLBACK_RPC_URL};
use crate::ClientError;

/// How the provider was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    /// A local signing key wraps the endpoint.
    Wallet,
    /// A configured endpoint that manages its own accounts.
    Node,
    /// Nothing was configured; the fixed local endpoint is used.
    Fallback,
}

/// The client used to reach the chain.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    /// Transactions are signed locally.
    Wallet(Arc<SignerMiddleware<Provider<Http>, LocalWallet>>),
    /// Transactions are signed by the node.
    Node(Arc<Provider<Http>>),
}

impl ProviderClient {
    /// Network id reported by `net_version`.
    pub async fn network_id(&self) -> Result<String, ClientError> {
        let version = match self {
            ProviderClient::Wallet(client) => client
                .get_net_version()
                .await
                .map_err(|e| ClientError::Provider(e.to_string())),
            ProviderClient::Node(client) => client
                .get_net_version()
                .await
                .map_err(|e| ClientError::Provider(e.to_string())),
        }?;
        Ok(version)
    }
}

/// A provider together with the account it grants.
#[derive(Debug, Clone)]
pub struct BoundProvider {
    /// How the provider was found.
    pub source: ProviderSource,
    /// The client itself.
    pub client: ProviderClient,
    /// The account granted by the provider. `None` if access was denied.
    pub account: Option<Address>,
}

/// Detects a provider. The first matching source wins and nothing is retried.
///
/// A denied account-access request does not fail binding: the session continues
/// without an account and the first transaction reports it.
pub async fn connect(config: &ProviderConfig) -> Result<BoundProvider, ClientError> {
    let url = config.rpc_url.as_deref().unwrap_or(FALLBACK_RPC_URL);
    let mut provider =
        Provider::<Http>::try_from(url).map_err(|e| ClientError::Provider(e.to_string()))?;
    if let Some(ms) = config.poll_interval_ms {
        provider = provider.interval(Duration::from_millis(ms));
    }

    if let Some(key_path) = &config.wallet_key_path {
        let chain_id = match config.chain_id {
            Some(chain_id) => chain_id,
            None => provider
                .get_chainid()
                .await
                .map_err(|e| ClientError::Provider(e.to_string()))?
                .as_u64(),
        };
        let wallet = load_wallet(key_path)?.with_chain_id(chain_id);
        let account = wallet.address();
        info!(%url, ?account, chain_id, "Using local wallet");
        return Ok(BoundProvider {
            source: ProviderSource::Wallet,
            client: ProviderClient::Wallet(Arc::new(SignerMiddleware::new(provider, wallet))),
            account: Some(account),
        });
    }

    let source = if config.rpc_url.is_some() {
        ProviderSource::Node
    } else {
        info!(%url, "No Ethereum provider configured, falling back to the local endpoint");
        ProviderSource::Fallback
    };

    let account = match provider
        .request::<_, Vec<Address>>("eth_requestAccounts", ())
        .await
    {
        Ok(accounts) => accounts.first().copied(),
        Err(err) => {
            warn!(%err, "Account access denied");
            None
        }
    };
    if let Some(account) = account {
        info!(%url, ?account, "Provider granted account access");
    }

    Ok(BoundProvider {
        source,
        client: ProviderClient::Node(Arc::new(provider)),
        account,
    })
}

/// Reads a hex encoded secp256k1 private key, with or without `0x`.
pub fn load_wallet(path: impl AsRef<Path>) -> Result<LocalWallet, ClientError> {
    let data = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ClientError::WalletKey(format!("{}: {e}", path.as_ref().display())))?;
    let data = data.trim();
    let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data))
        .map_err(|e| ClientError::WalletKey(e.to_string()))?;
    LocalWallet::from_bytes(&bytes).map_err(|e| ClientError::WalletKey(e.to_string()))
}
