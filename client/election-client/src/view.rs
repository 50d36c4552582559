use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::{Candidate, ElectionCall};

/// Label of the vote button while a vote can be cast.
pub const VOTE_LABEL: &str = "Vote";
/// Label of the vote button once the vote went through.
pub const VOTE_COUNTED_LABEL: &str = "Your vote has been counted";
/// Label of the end-election button.
pub const END_ELECTION_LABEL: &str = "End election";
/// Label of the remove-candidate button.
pub const REMOVE_CANDIDATE_LABEL: &str = "Remove candidate";

/// Identifies a control that triggers a guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlId {
    /// The vote form's submit button.
    Vote,
    /// The end-election button.
    EndElection,
    /// The remove-candidate button.
    RemoveCandidate,
}

/// A button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    /// Text on the button.
    pub label: String,
    /// Whether it can be clicked.
    pub enabled: bool,
    /// Whether it is shown at all.
    pub visible: bool,
}

impl Control {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: true,
            visible: true,
        }
    }
}

/// Open/closed status shown at the top of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElectionStatus {
    /// Votes are accepted.
    Open,
    /// An `ElectionEnded` event was received.
    Closed,
}

impl ElectionStatus {
    /// Text of the status label.
    pub fn label(&self) -> &'static str {
        match self {
            ElectionStatus::Open => "Election is OPEN",
            ElectionStatus::Closed => "Election is CLOSED",
        }
    }
}

/// An entry of the candidate selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateOption {
    /// Value submitted with the form.
    pub id: u64,
    /// Displayed text.
    pub name: String,
}

/// Received events, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventLog(VecDeque<String>);

impl EventLog {
    /// Adds an entry at the top of the log.
    pub fn push(&mut self, entry: String) {
        self.0.push_front(entry);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was logged yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a front-end needs to draw the election page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Loading indicator.
    pub loader_visible: bool,
    /// Main content.
    pub content_visible: bool,
    /// `Your Account: 0x..` line, once the account is known.
    pub account_display: Option<String>,
    /// Results table rows, ascending by id.
    pub results: Vec<Candidate>,
    /// Candidate selection list, ascending by id.
    pub selection: Vec<CandidateOption>,
    /// Vote and registration forms.
    pub forms_visible: bool,
    /// Status label.
    pub status: ElectionStatus,
    /// End-election button.
    pub end_election: Control,
    /// Vote button.
    pub vote: Control,
    /// Remove-candidate button.
    pub remove_candidate: Control,
    /// Received events.
    pub event_log: EventLog,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            loader_visible: true,
            content_visible: false,
            account_display: None,
            results: Vec::new(),
            selection: Vec::new(),
            forms_visible: true,
            status: ElectionStatus::Open,
            end_election: Control::new(END_ELECTION_LABEL),
            vote: Control::new(VOTE_LABEL),
            remove_candidate: Control::new(REMOVE_CANDIDATE_LABEL),
            event_log: EventLog::default(),
        }
    }
}

impl ViewState {
    /// Mutable access to a control.
    pub fn control_mut(&mut self, id: ControlId) -> &mut Control {
        match id {
            ControlId::Vote => &mut self.vote,
            ControlId::EndElection => &mut self.end_election,
            ControlId::RemoveCandidate => &mut self.remove_candidate,
        }
    }

    pub(crate) fn show_loader(&mut self) {
        self.loader_visible = true;
        self.content_visible = false;
    }

    pub(crate) fn show_content(&mut self) {
        self.loader_visible = false;
        self.content_visible = true;
    }

    /// Rebuilds the results table and the selection list. Removed candidates are skipped.
    pub(crate) fn show_candidates(&mut self, candidates: impl IntoIterator<Item = Candidate>) {
        self.results.clear();
        self.selection.clear();
        for candidate in candidates.into_iter().filter(Candidate::is_active) {
            self.selection.push(CandidateOption {
                id: candidate.id,
                name: candidate.name.clone(),
            });
            self.results.push(candidate);
        }
    }

    /// Terminal transition on `ElectionEnded`. Nothing reverts it.
    pub(crate) fn close_election(&mut self) {
        self.status = ElectionStatus::Closed;
        self.end_election.visible = false;
        self.forms_visible = false;
    }

    pub(crate) fn begin_action(&mut self, call: &ElectionCall) {
        if let Some(id) = call.control() {
            self.control_mut(id).enabled = false;
        }
    }

    pub(crate) fn action_confirmed(&mut self, call: &ElectionCall) {
        match call {
            ElectionCall::Vote { .. } => {
                self.show_loader();
                self.vote.label = VOTE_COUNTED_LABEL.to_string();
            }
            _ => {
                if let Some(id) = call.control() {
                    self.control_mut(id).enabled = true;
                }
            }
        }
    }

    pub(crate) fn action_rejected(&mut self, call: &ElectionCall) {
        if let Some(id) = call.control() {
            self.control_mut(id).enabled = true;
        }
        if let ElectionCall::Vote { .. } = call {
            self.vote.label = VOTE_LABEL.to_string();
        }
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "shown"
    } else {
        "hidden"
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.status.label())?;
        if let Some(account) = &self.account_display {
            writeln!(f, "{account}")?;
        }
        if self.loader_visible {
            writeln!(f, "Loading...")?;
        }
        if self.content_visible {
            writeln!(f, "{:<6} {:<32} {:>10}", "#", "Name", "Votes")?;
            for candidate in &self.results {
                writeln!(
                    f,
                    "{:<6} {:<32} {:>10}",
                    candidate.id, candidate.name, candidate.vote_count
                )?;
            }
        }
        writeln!(
            f,
            "Forms: {} | {}: {} | {}: {}",
            flag(self.forms_visible),
            self.vote.label,
            if self.vote.enabled { "enabled" } else { "disabled" },
            self.end_election.label,
            flag(self.end_election.visible),
        )?;
        if !self.event_log.is_empty() {
            writeln!(f, "Events:")?;
            for entry in self.event_log.entries() {
                writeln!(f, "  {entry}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ethers_core::types::U256;

    use super::*;
    use crate::CandidateStatus;

    fn candidate(id: u64, name: &str) -> Candidate {
        Candidate::from_raw(U256::from(id), name.to_string(), U256::zero()).unwrap()
    }

    #[test]
    fn removed_candidates_are_not_listed() {
        let mut view = ViewState::default();
        view.show_candidates(vec![
            candidate(1, "Alice"),
            candidate(2, ""),
            candidate(3, "Carol"),
        ]);

        let ids: Vec<u64> = view.results.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(view
            .results
            .iter()
            .all(|c| c.status == CandidateStatus::Active));
        let options: Vec<u64> = view.selection.iter().map(|o| o.id).collect();
        assert_eq!(options, vec![1, 3]);
    }

    #[test]
    fn rebuilding_replaces_previous_rows() {
        let mut view = ViewState::default();
        view.show_candidates(vec![candidate(1, "Alice"), candidate(2, "Bob")]);
        view.show_candidates(vec![candidate(1, "Alice")]);
        assert_eq!(view.results.len(), 1);
        assert_eq!(view.selection.len(), 1);
    }

    #[test]
    fn event_log_is_newest_first() {
        let mut log = EventLog::default();
        log.push("first".into());
        log.push("second".into());
        assert_eq!(log.entries().collect::<Vec<_>>(), vec!["second", "first"]);
    }

    #[test]
    fn failed_vote_restores_button() {
        let mut view = ViewState::default();
        let call = ElectionCall::Vote { candidate_id: 1 };
        view.begin_action(&call);
        assert!(!view.vote.enabled);
        view.action_rejected(&call);
        assert!(view.vote.enabled);
        assert_eq!(view.vote.label, VOTE_LABEL);
    }

    #[test]
    fn display_lists_rows_when_content_is_shown() {
        let mut view = ViewState::default();
        view.show_candidates(vec![candidate(1, "Alice")]);
        view.show_content();
        let text = view.to_string();
        assert!(text.starts_with("Election is OPEN"));
        assert!(text.contains("Alice"));
        assert!(!text.contains("Loading..."));
    }
}
