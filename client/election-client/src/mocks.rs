//! In-memory election contract for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use ethers_core::types::{Address, TxHash, U256};
use tokio::sync::watch;

use crate::events::{EventSender, EventStream};
use crate::{Candidate, ClientError, ElectionCall, ElectionContract, ElectionEvent, EventKind};

/// Names of the candidates a fresh [`MockElection`] starts with.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["Candidate 1", "Candidate 2"];

#[derive(Default)]
struct State {
    /// `(name, votes)`, index 0 is candidate 1. Removed candidates keep an empty name.
    candidates: Vec<(String, u64)>,
    registered: HashSet<Address>,
    voted: HashSet<Address>,
    ended: bool,
    submitted: Vec<(ElectionCall, Address)>,
    /// Name of the log each confirmed transaction emitted.
    logs: HashMap<TxHash, &'static str>,
    failures: VecDeque<String>,
    failing_reads: bool,
    failing_subscriptions: HashSet<EventKind>,
    listeners: Vec<(EventKind, EventSender)>,
}

/// An election contract kept in memory.
///
/// It enforces the rules the client relies on:
/// - registering the same voter twice is rejected, and `voters` reports registered accounts,
/// - removing an unknown or already removed candidate is rejected and removal blanks the name,
/// - only registered accounts vote, at most once, for an active candidate while the election is open,
/// - resetting clears votes and voters and reopens the election.
///
/// Successful transactions emit the matching events to every subscriber of that kind.
/// Registration emits `VoterRegistered`, which the client does not subscribe to; it is
/// only visible through [`MockElection::receipt_log`].
pub struct MockElection {
    coinbase: Address,
    state: Mutex<State>,
    gate: watch::Sender<bool>,
}

impl Default for MockElection {
    fn default() -> Self {
        Self::new(Address::repeat_byte(0xaa), DEFAULT_CANDIDATES)
    }
}

impl MockElection {
    /// Creates an election whose provider reports `coinbase` and whose candidates are `names`.
    pub fn new<'a>(coinbase: Address, names: impl IntoIterator<Item = &'a str>) -> Self {
        let (gate, _) = watch::channel(true);
        let state = State {
            candidates: names.into_iter().map(|n| (n.to_string(), 0)).collect(),
            ..Default::default()
        };
        Self {
            coinbase,
            state: Mutex::new(state),
            gate,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a candidate and emits `CandidateAdded`.
    pub fn add_candidate(&self, name: &str) -> u64 {
        let mut state = self.state();
        state.candidates.push((name.to_string(), 0));
        let id = state.candidates.len() as u64;
        Self::emit_locked(
            &mut state,
            ElectionEvent::CandidateAdded {
                name: name.to_string(),
            },
        );
        id
    }

    /// Registers `account` as a voter without sending a transaction.
    pub fn register(&self, account: Address) {
        self.state().registered.insert(account);
    }

    /// Name of the log emitted by the confirmed transaction `tx_hash`.
    pub fn receipt_log(&self, tx_hash: TxHash) -> Option<&'static str> {
        self.state().logs.get(&tx_hash).copied()
    }

    /// Makes every later subscription to `kind` fail.
    pub fn fail_subscriptions(&self, kind: EventKind) {
        self.state().failing_subscriptions.insert(kind);
    }

    /// Makes the next transaction fail with `reason`.
    pub fn fail_next_transaction(&self, reason: &str) {
        self.state().failures.push_back(reason.to_string());
    }

    /// Makes every read fail until called again with `false`.
    pub fn fail_reads(&self, failing: bool) {
        self.state().failing_reads = failing;
    }

    /// Holds every transaction in flight until [`Self::release_transactions`].
    pub fn hold_transactions(&self) {
        self.gate.send_replace(false);
    }

    /// Lets held and future transactions through.
    pub fn release_transactions(&self) {
        self.gate.send_replace(true);
    }

    /// Transactions that reached the contract, in order, with their sender.
    pub fn submitted(&self) -> Vec<(ElectionCall, Address)> {
        self.state().submitted.clone()
    }

    /// Whether `account` was registered as a voter.
    pub fn is_registered(&self, account: Address) -> bool {
        self.state().registered.contains(&account)
    }

    /// Whether the election was ended.
    pub fn is_ended(&self) -> bool {
        self.state().ended
    }

    /// Delivers `event` to every subscriber of its kind.
    pub fn emit(&self, event: ElectionEvent) {
        Self::emit_locked(&mut self.state(), event);
    }

    /// Delivers a subscription error to every subscriber of `kind`.
    pub fn emit_error(&self, kind: EventKind, reason: &str) {
        let mut state = self.state();
        state.listeners.retain(|(listening, sender)| {
            *listening != kind
                || sender
                    .unbounded_send(Err(ClientError::Subscription {
                        kind,
                        reason: reason.to_string(),
                    }))
                    .is_ok()
        });
    }

    /// Ends every open subscription.
    pub fn close_subscriptions(&self) {
        self.state().listeners.clear();
    }

    fn emit_locked(state: &mut State, event: ElectionEvent) {
        let kind = event.kind();
        state.listeners.retain(|(listening, sender)| {
            *listening != kind || sender.unbounded_send(Ok(event.clone())).is_ok()
        });
    }

    fn read_guard(&self, method: &'static str) -> Result<MutexGuard<'_, State>, ClientError> {
        let state = self.state();
        if state.failing_reads {
            return Err(ClientError::Call {
                method,
                reason: "connection refused".to_string(),
            });
        }
        Ok(state)
    }

    /// Applies `call` and returns the name of the log it emits.
    fn apply(
        state: &mut State,
        call: &ElectionCall,
        from: Address,
    ) -> Result<&'static str, String> {
        if let Some(reason) = state.failures.pop_front() {
            return Err(reason);
        }
        let event = match *call {
            ElectionCall::Vote { candidate_id } => {
                if state.ended {
                    return Err("election has ended".to_string());
                }
                if !state.registered.contains(&from) {
                    return Err("voter not registered".to_string());
                }
                if state.voted.contains(&from) {
                    return Err("already voted".to_string());
                }
                let candidate = candidate_id
                    .checked_sub(1)
                    .and_then(|index| state.candidates.get_mut(index as usize))
                    .filter(|(name, _)| !name.is_empty())
                    .ok_or_else(|| "invalid candidate".to_string())?;
                candidate.1 += 1;
                state.voted.insert(from);
                ElectionEvent::Voted {
                    voter: from,
                    candidate_id,
                }
            }
            ElectionCall::RegisterVoter { voter } => {
                if !state.registered.insert(voter) {
                    return Err("voter already registered".to_string());
                }
                return Ok("VoterRegistered");
            }
            ElectionCall::RemoveCandidate { candidate_id } => {
                let candidate = candidate_id
                    .checked_sub(1)
                    .and_then(|index| state.candidates.get_mut(index as usize))
                    .filter(|(name, _)| !name.is_empty())
                    .ok_or_else(|| "candidate does not exist".to_string())?;
                candidate.0.clear();
                ElectionEvent::CandidateRemoved { candidate_id }
            }
            ElectionCall::EndElection => {
                if state.ended {
                    return Err("election already ended".to_string());
                }
                state.ended = true;
                ElectionEvent::ElectionEnded
            }
            ElectionCall::ResetElection => {
                state.ended = false;
                state.voted.clear();
                state.registered.clear();
                for candidate in &mut state.candidates {
                    candidate.1 = 0;
                }
                ElectionEvent::ElectionReset
            }
        };
        let log = event.kind().abi_name();
        Self::emit_locked(state, event);
        Ok(log)
    }
}

#[async_trait]
impl ElectionContract for MockElection {
    async fn coinbase(&self) -> Result<Address, ClientError> {
        self.read_guard("eth_coinbase").map(|_| self.coinbase)
    }

    async fn candidates_count(&self) -> Result<u64, ClientError> {
        let state = self.read_guard("candidatesCount")?;
        Ok(state.candidates.len() as u64)
    }

    async fn candidate(&self, index: u64) -> Result<Candidate, ClientError> {
        let state = self.read_guard("candidates")?;
        let (name, votes) = index
            .checked_sub(1)
            .and_then(|i| state.candidates.get(i as usize))
            .cloned()
            .ok_or_else(|| ClientError::Call {
                method: "candidates",
                reason: "index out of bounds".to_string(),
            })?;
        Candidate::from_raw(U256::from(index), name, U256::from(votes))
    }

    async fn voters(&self, account: Address) -> Result<bool, ClientError> {
        let state = self.read_guard("voters")?;
        Ok(state.registered.contains(&account))
    }

    async fn submit(&self, call: ElectionCall, from: Address) -> Result<TxHash, ClientError> {
        let mut gate = self.gate.subscribe();
        // The sender lives as long as `self`, so the gate cannot close under us.
        let _ = gate.wait_for(|open| *open).await;

        let mut state = self.state();
        state.submitted.push((call.clone(), from));
        let tx_hash = TxHash::from_low_u64_be(state.submitted.len() as u64);
        let log = Self::apply(&mut state, &call, from).map_err(|reason| {
            ClientError::Transaction {
                method: call.method_name(),
                reason,
            }
        })?;
        state.logs.insert(tx_hash, log);
        Ok(tx_hash)
    }

    async fn subscribe(&self, kind: EventKind) -> Result<EventStream, ClientError> {
        let mut state = self.state();
        if state.failing_subscriptions.contains(&kind) {
            return Err(ClientError::Subscription {
                kind,
                reason: "filter not found".to_string(),
            });
        }
        let (sender, stream) = EventStream::channel(kind);
        state.listeners.push((kind, sender));
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn voter(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[tokio::test]
    async fn double_registration_is_rejected() {
        let election = MockElection::default();
        let call = ElectionCall::RegisterVoter { voter: voter(1) };
        assert!(!election.voters(voter(1)).await.unwrap());
        let tx_hash = election.submit(call.clone(), voter(9)).await.unwrap();
        assert!(election.voters(voter(1)).await.unwrap());
        assert_eq!(election.receipt_log(tx_hash), Some("VoterRegistered"));

        let err = election.submit(call, voter(9)).await.unwrap_err();
        assert!(matches!(err, ClientError::Transaction { method: "registerVoter", .. }));
    }

    #[tokio::test]
    async fn removal_tombstones_the_candidate() {
        let election = MockElection::default();
        election
            .submit(ElectionCall::RemoveCandidate { candidate_id: 1 }, voter(9))
            .await
            .unwrap();
        let removed = election.candidate(1).await.unwrap();
        assert_eq!(removed.name, "");
        assert!(!removed.is_active());

        assert!(election
            .submit(ElectionCall::RemoveCandidate { candidate_id: 999 }, voter(9))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn vote_counts_once_and_emits() {
        let election = MockElection::default();
        let mut votes = election.subscribe(EventKind::Voted).await.unwrap();
        election.register(voter(1));

        let tx_hash = election
            .submit(ElectionCall::Vote { candidate_id: 2 }, voter(1))
            .await
            .unwrap();
        assert_eq!(election.receipt_log(tx_hash), Some("Voted"));
        assert!(election
            .submit(ElectionCall::Vote { candidate_id: 1 }, voter(1))
            .await
            .is_err());

        assert_eq!(election.candidate(2).await.unwrap().vote_count, U256::one());
        assert_eq!(
            votes.next().await.unwrap().unwrap(),
            ElectionEvent::Voted {
                voter: voter(1),
                candidate_id: 2
            }
        );
    }

    #[tokio::test]
    async fn unregistered_vote_is_rejected() {
        let election = MockElection::default();
        let err = election
            .submit(ElectionCall::Vote { candidate_id: 1 }, voter(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("voter not registered"));
        assert_eq!(election.candidate(1).await.unwrap().vote_count, U256::zero());
    }

    #[tokio::test]
    async fn reset_reopens_and_clears_votes() {
        let election = MockElection::default();
        election.register(voter(1));
        election
            .submit(ElectionCall::Vote { candidate_id: 1 }, voter(1))
            .await
            .unwrap();
        election
            .submit(ElectionCall::EndElection, voter(9))
            .await
            .unwrap();
        assert!(election.is_ended());

        election
            .submit(ElectionCall::ResetElection, voter(9))
            .await
            .unwrap();
        assert!(!election.is_ended());
        assert!(!election.voters(voter(1)).await.unwrap());
        assert_eq!(election.candidate(1).await.unwrap().vote_count, U256::zero());
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let election = MockElection::default();
        election.fail_next_transaction("out of gas");
        let err = election
            .submit(ElectionCall::EndElection, voter(9))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of gas"));
        election
            .submit(ElectionCall::EndElection, voter(9))
            .await
            .unwrap();
    }
}
