use std::sync::Arc;

use async_trait::async_trait;
use ethers_contract::Contract;
use ethers_core::abi::{Detokenize, RawLog, Tokenize};
use ethers_core::types::{Address, BlockNumber, Filter, Log, TxHash, U256, U64};
use ethers_providers::{FilterKind, FilterWatcher, Middleware};
use futures::StreamExt;
use tracing::{debug, info};

use crate::artifact::ContractArtifact;
use crate::candidate::to_u64;
use crate::events::{ElectionEvent, EventKind, EventStream};
use crate::provider::{BoundProvider, ProviderClient};
use crate::{Candidate, ClientError, ContractConfig, ElectionCall, ElectionContract};

/// The election contract reached through an `ethers` middleware.
pub struct EthElection<M: Middleware> {
    client: Arc<M>,
    contract: Contract<M>,
    address: Address,
    signer: Option<Address>,
}

impl<M: Middleware + 'static> EthElection<M> {
    /// Binds `artifact` at `address`.
    ///
    /// `signer` is the locally held account, if any. It is reported as the
    /// coinbase instead of asking the node.
    pub fn new(
        client: Arc<M>,
        artifact: &ContractArtifact,
        address: Address,
        signer: Option<Address>,
    ) -> Self {
        let contract = Contract::new(address, artifact.abi().clone(), client.clone());
        Self {
            client,
            contract,
            address,
            signer,
        }
    }

    /// Address of the bound contract.
    pub fn address(&self) -> Address {
        self.address
    }

    async fn read<T, D>(&self, method: &'static str, args: T) -> Result<D, ClientError>
    where
        T: Tokenize + Send,
        D: Detokenize + Send + Sync,
    {
        let call = self
            .contract
            .method::<T, D>(method, args)
            .map_err(|e| ClientError::Call {
                method,
                reason: e.to_string(),
            })?;
        call.call().await.map_err(|e| ClientError::Call {
            method,
            reason: e.to_string(),
        })
    }

    async fn send<T: Tokenize + Send>(
        &self,
        method: &'static str,
        args: T,
        from: Address,
    ) -> Result<TxHash, ClientError> {
        let failed = |reason: String| ClientError::Transaction { method, reason };
        let call = self
            .contract
            .method::<T, ()>(method, args)
            .map_err(|e| failed(e.to_string()))?
            .from(from);
        let pending = call.send().await.map_err(|e| failed(e.to_string()))?;
        let tx_hash = *pending;
        debug!(%method, ?tx_hash, "Transaction sent");

        let receipt = pending
            .await
            .map_err(|e| failed(e.to_string()))?
            .ok_or_else(|| failed("dropped from the mempool".to_string()))?;
        if receipt.status == Some(U64::zero()) {
            return Err(failed("reverted".to_string()));
        }
        Ok(receipt.transaction_hash)
    }
}

#[async_trait]
impl<M: Middleware + 'static> ElectionContract for EthElection<M> {
    async fn coinbase(&self) -> Result<Address, ClientError> {
        if let Some(signer) = self.signer {
            return Ok(signer);
        }
        self.client
            .provider()
            .request::<_, Address>("eth_coinbase", ())
            .await
            .map_err(|e| ClientError::Provider(e.to_string()))
    }

    async fn candidates_count(&self) -> Result<u64, ClientError> {
        let count: U256 = self.read("candidatesCount", ()).await?;
        to_u64(count, "candidates count")
    }

    async fn candidate(&self, index: u64) -> Result<Candidate, ClientError> {
        let (id, name, vote_count): (U256, String, U256) =
            self.read("candidates", U256::from(index)).await?;
        Candidate::from_raw(id, name, vote_count)
    }

    async fn voters(&self, account: Address) -> Result<bool, ClientError> {
        self.read("voters", account).await
    }

    async fn submit(&self, call: ElectionCall, from: Address) -> Result<TxHash, ClientError> {
        let method = call.method_name();
        match call {
            ElectionCall::Vote { candidate_id } => {
                self.send(method, U256::from(candidate_id), from).await
            }
            ElectionCall::RegisterVoter { voter } => self.send(method, voter, from).await,
            ElectionCall::RemoveCandidate { candidate_id } => {
                self.send(method, U256::from(candidate_id), from).await
            }
            ElectionCall::EndElection | ElectionCall::ResetElection => {
                self.send(method, (), from).await
            }
        }
    }

    async fn subscribe(&self, kind: EventKind) -> Result<EventStream, ClientError> {
        let event = self
            .contract
            .abi()
            .event(kind.abi_name())
            .map_err(|e| ClientError::Subscription {
                kind,
                reason: e.to_string(),
            })?
            .clone();
        let filter = Filter::new()
            .address(self.address)
            .topic0(event.signature())
            .from_block(BlockNumber::Latest);

        // Installed here so that a refused filter fails the subscription itself.
        let id = self
            .client
            .new_filter(FilterKind::Logs(&filter))
            .await
            .map_err(|e| ClientError::Subscription {
                kind,
                reason: e.to_string(),
            })?;
        debug!(%kind, ?id, "Event filter installed");

        let client = self.client.clone();
        let (sender, stream) = EventStream::channel(kind);
        let pump = tokio::spawn(async move {
            let provider = client.provider();
            let mut watcher =
                FilterWatcher::<_, Log>::new(id, provider).interval(provider.get_interval());
            info!(%kind, "Listening for events");
            while let Some(log) = watcher.next().await {
                let raw = RawLog {
                    topics: log.topics,
                    data: log.data.to_vec(),
                };
                let item = event
                    .parse_log(raw)
                    .map_err(|e| ClientError::Subscription {
                        kind,
                        reason: e.to_string(),
                    })
                    .and_then(|parsed| ElectionEvent::from_abi_log(kind, parsed));
                if sender.unbounded_send(item).is_err() {
                    break;
                }
            }
        });
        Ok(stream.with_pump(pump))
    }
}

/// Loads the interface description named in `config` and binds it through `provider`.
pub async fn bind(
    provider: &BoundProvider,
    config: &ContractConfig,
) -> Result<Arc<dyn ElectionContract>, ClientError> {
    let artifact = ContractArtifact::load(&config.artifact_path)?;
    let network_id = match config.address {
        // Only needed to look the deployment up in the artifact.
        Some(_) => String::new(),
        None => provider.client.network_id().await?,
    };
    let address = artifact.resolve_address(config.address, &network_id)?;
    info!(?address, artifact = %config.artifact_path.display(), "Bound election contract");

    let contract: Arc<dyn ElectionContract> = match &provider.client {
        ProviderClient::Wallet(client) => Arc::new(EthElection::new(
            client.clone(),
            &artifact,
            address,
            provider.account,
        )),
        ProviderClient::Node(client) => {
            Arc::new(EthElection::new(client.clone(), &artifact, address, None))
        }
    };
    Ok(contract)
}
