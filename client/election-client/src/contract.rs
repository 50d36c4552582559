use std::fmt;

use async_trait::async_trait;
use ethers_core::types::{Address, TxHash};
use serde::{Deserialize, Serialize};

use crate::events::{EventKind, EventStream};
use crate::{Candidate, ClientError};

/// A state-changing call on the election contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionCall {
    /// `vote(uint256)`
    Vote {
        /// Candidate to vote for.
        candidate_id: u64,
    },
    /// `registerVoter(address)`
    RegisterVoter {
        /// Account allowed to vote.
        voter: Address,
    },
    /// `removeCandidate(uint256)`
    RemoveCandidate {
        /// Candidate to remove.
        candidate_id: u64,
    },
    /// `endElection()`
    EndElection,
    /// `resetElection()`
    ResetElection,
}

impl ElectionCall {
    /// Name of the method in the contract ABI.
    pub fn method_name(&self) -> &'static str {
        match self {
            ElectionCall::Vote { .. } => "vote",
            ElectionCall::RegisterVoter { .. } => "registerVoter",
            ElectionCall::RemoveCandidate { .. } => "removeCandidate",
            ElectionCall::EndElection => "endElection",
            ElectionCall::ResetElection => "resetElection",
        }
    }

    /// Message logged once the transaction is confirmed.
    pub fn confirmation(&self) -> &'static str {
        match self {
            ElectionCall::Vote { .. } => "Vote counted.",
            ElectionCall::RegisterVoter { .. } => "Voter registered.",
            ElectionCall::RemoveCandidate { .. } => "Candidate removed.",
            ElectionCall::EndElection => "Election ended.",
            ElectionCall::ResetElection => "Election reset.",
        }
    }
}

impl fmt::Display for ElectionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElectionCall::Vote { candidate_id } => write!(f, "vote({candidate_id})"),
            ElectionCall::RegisterVoter { voter } => write!(f, "registerVoter({voter:?})"),
            ElectionCall::RemoveCandidate { candidate_id } => {
                write!(f, "removeCandidate({candidate_id})")
            }
            ElectionCall::EndElection => f.write_str("endElection()"),
            ElectionCall::ResetElection => f.write_str("resetElection()"),
        }
    }
}

/// The surface of the election contract the client depends on.
///
/// Implemented over a live provider by [`crate::eth::EthElection`] and, with the
/// `mocks` feature, in memory by `mocks::MockElection`.
#[async_trait]
pub trait ElectionContract: Send + Sync {
    /// The provider's default account.
    async fn coinbase(&self) -> Result<Address, ClientError>;

    /// `candidatesCount()`
    async fn candidates_count(&self) -> Result<u64, ClientError>;

    /// `candidates(index)`, with `index` starting at 1.
    async fn candidate(&self, index: u64) -> Result<Candidate, ClientError>;

    /// `voters(account)`: whether `account` has already voted.
    async fn voters(&self, account: Address) -> Result<bool, ClientError>;

    /// Sends `call` from `from` and resolves once the transaction is mined.
    async fn submit(&self, call: ElectionCall, from: Address) -> Result<TxHash, ClientError>;

    /// Opens a stream of `kind` events starting at the current chain head.
    async fn subscribe(&self, kind: EventKind) -> Result<EventStream, ClientError>;
}
