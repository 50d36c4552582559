use std::sync::{Arc, OnceLock};

use ethers_core::types::Address;
use tokio::sync::watch;
use tracing::info;

use crate::{eth, provider, ClientConfig, ClientError, ElectionContract, PendingFlag, ViewState};

/// Everything one election session shares: the bound contract, the account,
/// the pending flag and the view model.
///
/// The account is written at most once. The pending flag is only touched by the
/// transactional actions. The view is only mutated through [`Self::update_view`].
pub struct ElectionSession {
    contract: Arc<dyn ElectionContract>,
    account: OnceLock<Address>,
    pub(crate) pending: PendingFlag,
    view: watch::Sender<ViewState>,
}

impl ElectionSession {
    /// Creates a session over an already bound contract.
    pub fn new(contract: Arc<dyn ElectionContract>, account: Option<Address>) -> Arc<Self> {
        let (view, _) = watch::channel(ViewState::default());
        let session = Self {
            contract,
            account: OnceLock::new(),
            pending: PendingFlag::default(),
            view,
        };
        if let Some(account) = account {
            session.adopt_account(account);
        }
        Arc::new(session)
    }

    /// Detects the provider, loads the contract interface and binds the session.
    pub async fn connect(config: &ClientConfig) -> Result<Arc<Self>, ClientError> {
        let provider = provider::connect(&config.provider).await?;
        info!(source = ?provider.source, "Provider detected");
        let contract = eth::bind(&provider, &config.contract).await?;
        Ok(Self::new(contract, provider.account))
    }

    /// The bound contract.
    pub fn contract(&self) -> &Arc<dyn ElectionContract> {
        &self.contract
    }

    /// The account transactions are sent from, once known.
    pub fn account(&self) -> Option<Address> {
        self.account.get().copied()
    }

    /// Records `candidate` as the session account unless one is already set,
    /// and returns the account in effect.
    pub(crate) fn adopt_account(&self, candidate: Address) -> Address {
        *self.account.get_or_init(|| candidate)
    }

    /// Returns true while a guarded transaction is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// A snapshot of the view model.
    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// Observes every change of the view model.
    pub fn watch_view(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    pub(crate) fn update_view(&self, update: impl FnOnce(&mut ViewState)) {
        self.view.send_modify(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockElection;

    #[test]
    fn account_is_write_once() {
        let first = Address::repeat_byte(1);
        let session = ElectionSession::new(Arc::new(MockElection::default()), Some(first));
        assert_eq!(session.adopt_account(Address::repeat_byte(2)), first);
        assert_eq!(session.account(), Some(first));
    }

    #[test]
    fn starts_loading_and_idle() {
        let session = ElectionSession::new(Arc::new(MockElection::default()), None);
        let view = session.view();
        assert!(view.loader_visible);
        assert!(!view.content_visible);
        assert!(!session.is_pending());
        assert_eq!(session.account(), None);
    }
}
