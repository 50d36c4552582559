use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Whether a candidate still takes part in the election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// The candidate can receive votes.
    Active,
    /// The candidate was removed from the election.
    Removed,
}

/// A candidate as reported by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// 1-based contract index.
    pub id: u64,
    /// Display name. Empty for removed candidates.
    pub name: String,
    /// Votes received so far.
    pub vote_count: U256,
    /// Removal status.
    pub status: CandidateStatus,
}

impl Candidate {
    /// Builds a candidate from the raw `candidates(i)` tuple.
    ///
    /// The contract marks removed candidates by blanking their name; that
    /// convention stops here and the rest of the client only looks at `status`.
    pub fn from_raw(id: U256, name: String, vote_count: U256) -> Result<Self, ClientError> {
        let status = if name.is_empty() {
            CandidateStatus::Removed
        } else {
            CandidateStatus::Active
        };
        Ok(Self {
            id: to_u64(id, "candidate id")?,
            name,
            vote_count,
            status,
        })
    }

    /// Returns true if the candidate has not been removed.
    pub fn is_active(&self) -> bool {
        self.status == CandidateStatus::Active
    }
}

pub(crate) fn to_u64(value: U256, field: &'static str) -> Result<u64, ClientError> {
    if value > U256::from(u64::MAX) {
        return Err(ClientError::OutOfRange { field });
    }
    Ok(value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_marks_candidate_removed() {
        let removed = Candidate::from_raw(2.into(), String::new(), 5.into()).unwrap();
        assert_eq!(removed.status, CandidateStatus::Removed);
        assert!(!removed.is_active());

        let active = Candidate::from_raw(1.into(), "Alice".into(), 0.into()).unwrap();
        assert_eq!(active.status, CandidateStatus::Active);
        assert_eq!(active.id, 1);
    }

    #[test]
    fn oversized_id_is_rejected() {
        let id = U256::from(u64::MAX) + 1;
        let err = Candidate::from_raw(id, "Bob".into(), 0.into()).unwrap_err();
        assert!(matches!(err, ClientError::OutOfRange { .. }));
    }
}
