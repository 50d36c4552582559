use ethers_core::types::{Address, TxHash};
use serde::Serialize;
use tracing::{info, warn};

use crate::{ClientError, ElectionCall, ElectionSession};

/// What happened to a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionOutcome {
    /// Another guarded transaction was in flight; nothing was sent.
    Ignored,
    /// The transaction was mined.
    Confirmed(TxHash),
    /// The transaction could not be sent or was reverted.
    Rejected(String),
}

impl ElectionSession {
    /// `vote(candidateId)`. One-shot: after success the vote button stays
    /// disabled and the pending flag stays set for the rest of the session.
    pub async fn cast_vote(&self, candidate_id: u64) -> ActionOutcome {
        self.perform(ElectionCall::Vote { candidate_id }).await
    }

    /// `endElection()`. Guarded; the flag is released however it ends.
    pub async fn end_election(&self) -> ActionOutcome {
        self.perform(ElectionCall::EndElection).await
    }

    /// `removeCandidate(candidateId)`. Guarded; re-renders on success.
    pub async fn remove_candidate(&self, candidate_id: u64) -> ActionOutcome {
        self.perform(ElectionCall::RemoveCandidate { candidate_id }).await
    }

    /// `registerVoter(address)`. Not guarded.
    pub async fn register_voter(&self, voter: Address) -> ActionOutcome {
        self.perform(ElectionCall::RegisterVoter { voter }).await
    }

    /// `resetElection()`. Not guarded.
    pub async fn reset_election(&self) -> ActionOutcome {
        self.perform(ElectionCall::ResetElection).await
    }

    /// Runs `call` through the guard its policy asks for.
    ///
    /// The pending flag is held by a guard, so it is cleared even if this future
    /// is dropped mid-flight. The disabled control is not restored in that case.
    pub async fn perform(&self, call: ElectionCall) -> ActionOutcome {
        let policy = call.guard_policy();
        let guard = if policy.is_guarded() {
            let Some(guard) = self.pending.acquire() else {
                info!(%call, "A previous transaction is still pending");
                return ActionOutcome::Ignored;
            };
            self.update_view(|view| view.begin_action(&call));
            Some(guard)
        } else {
            None
        };

        match self.send(&call).await {
            Ok(tx_hash) => {
                info!(%call, ?tx_hash, "{}", call.confirmation());
                self.update_view(|view| view.action_confirmed(&call));
                if let Some(guard) = guard {
                    if policy.releases_on_success() {
                        drop(guard);
                    } else {
                        guard.keep();
                    }
                }
                if call.rerenders_on_success() {
                    self.render().await;
                }
                ActionOutcome::Confirmed(tx_hash)
            }
            Err(err) => {
                warn!(%call, %err, "Transaction failed");
                if let Some(guard) = guard {
                    self.update_view(|view| view.action_rejected(&call));
                    drop(guard);
                }
                ActionOutcome::Rejected(err.to_string())
            }
        }
    }

    async fn send(&self, call: &ElectionCall) -> Result<TxHash, ClientError> {
        let from = self.account().ok_or(ClientError::NoAccount)?;
        self.contract().submit(call.clone(), from).await
    }
}
