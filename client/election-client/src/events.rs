use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use ethers_core::abi::{Log as AbiLog, Token};
use ethers_core::types::{Address, U256};
use ethers_core::utils::to_checksum;
use futures::channel::mpsc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::candidate::to_u64;
use crate::ClientError;

/// The five events emitted by the election contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `VotedEvent(address voter, uint256 candidateId)`
    Voted,
    /// `CandidateAdded(string name)`
    CandidateAdded,
    /// `CandidateRemoved(uint256 candidateId)`
    CandidateRemoved,
    /// `ElectionEnded()`
    ElectionEnded,
    /// `ElectionReset()`
    ElectionReset,
}

impl EventKind {
    /// Every kind, in subscription order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Voted,
        EventKind::CandidateAdded,
        EventKind::CandidateRemoved,
        EventKind::ElectionEnded,
        EventKind::ElectionReset,
    ];

    /// Name of the event in the contract ABI.
    pub fn abi_name(&self) -> &'static str {
        match self {
            EventKind::Voted => "VotedEvent",
            EventKind::CandidateAdded => "CandidateAdded",
            EventKind::CandidateRemoved => "CandidateRemoved",
            EventKind::ElectionEnded => "ElectionEnded",
            EventKind::ElectionReset => "ElectionReset",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

/// A decoded contract event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionEvent {
    /// A vote was cast.
    Voted {
        /// Account that voted.
        voter: Address,
        /// Candidate that received the vote.
        candidate_id: u64,
    },
    /// A candidate joined the election.
    CandidateAdded {
        /// Name of the new candidate.
        name: String,
    },
    /// A candidate was removed.
    CandidateRemoved {
        /// Id of the removed candidate.
        candidate_id: u64,
    },
    /// The election was closed.
    ElectionEnded,
    /// Votes and voters were cleared.
    ElectionReset,
}

impl ElectionEvent {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ElectionEvent::Voted { .. } => EventKind::Voted,
            ElectionEvent::CandidateAdded { .. } => EventKind::CandidateAdded,
            ElectionEvent::CandidateRemoved { .. } => EventKind::CandidateRemoved,
            ElectionEvent::ElectionEnded => EventKind::ElectionEnded,
            ElectionEvent::ElectionReset => EventKind::ElectionReset,
        }
    }

    /// Human readable line for the event log.
    pub fn log_entry(&self) -> String {
        match self {
            ElectionEvent::Voted {
                voter,
                candidate_id,
            } => format!(
                "Voter {} voted for candidate #{}",
                to_checksum(voter, None),
                candidate_id
            ),
            ElectionEvent::CandidateAdded { name } => format!("New candidate added: {name}"),
            ElectionEvent::CandidateRemoved { candidate_id } => {
                format!("Candidate #{candidate_id} was removed.")
            }
            ElectionEvent::ElectionEnded => "Election has ended.".to_string(),
            ElectionEvent::ElectionReset => "Election has been reset.".to_string(),
        }
    }

    /// Decodes a log already parsed against the ABI entry of `kind`.
    pub fn from_abi_log(kind: EventKind, log: AbiLog) -> Result<Self, ClientError> {
        let param = |name: &str| {
            log.params
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.value.clone())
                .ok_or_else(|| ClientError::Subscription {
                    kind,
                    reason: format!("missing event parameter `{name}`"),
                })
        };
        let mismatch = |name: &str| ClientError::Subscription {
            kind,
            reason: format!("unexpected type for event parameter `{name}`"),
        };

        let event = match kind {
            EventKind::Voted => {
                let voter = match param("voter")? {
                    Token::Address(voter) => voter,
                    _ => return Err(mismatch("voter")),
                };
                ElectionEvent::Voted {
                    voter,
                    candidate_id: uint_param(param("candidateId")?)
                        .ok_or_else(|| mismatch("candidateId"))
                        .and_then(|id| to_u64(id, "candidate id"))?,
                }
            }
            EventKind::CandidateAdded => match param("name")? {
                Token::String(name) => ElectionEvent::CandidateAdded { name },
                _ => return Err(mismatch("name")),
            },
            EventKind::CandidateRemoved => ElectionEvent::CandidateRemoved {
                candidate_id: uint_param(param("candidateId")?)
                    .ok_or_else(|| mismatch("candidateId"))
                    .and_then(|id| to_u64(id, "candidate id"))?,
            },
            EventKind::ElectionEnded => ElectionEvent::ElectionEnded,
            EventKind::ElectionReset => ElectionEvent::ElectionReset,
        };
        Ok(event)
    }
}

fn uint_param(token: Token) -> Option<U256> {
    match token {
        Token::Uint(value) => Some(value),
        _ => None,
    }
}

/// Sending half of an [`EventStream`].
pub type EventSender = mpsc::UnboundedSender<Result<ElectionEvent, ClientError>>;

/// An unbounded stream of events of a single kind, starting at the chain head
/// at the time of subscription.
///
/// The stream cannot be restarted once it ends. Dropping it stops the task
/// that feeds it, if any.
pub struct EventStream {
    kind: EventKind,
    receiver: mpsc::UnboundedReceiver<Result<ElectionEvent, ClientError>>,
    pump: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Creates a stream together with the sender that feeds it.
    pub fn channel(kind: EventKind) -> (EventSender, Self) {
        let (sender, receiver) = mpsc::unbounded();
        let stream = Self {
            kind,
            receiver,
            pump: None,
        };
        (sender, stream)
    }

    /// Ties the lifetime of the task producing events to this stream.
    pub fn with_pump(mut self, pump: JoinHandle<()>) -> Self {
        self.pump = Some(pump);
        self
    }

    /// The event kind carried by this stream.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Stream for EventStream {
    type Item = Result<ElectionEvent, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
