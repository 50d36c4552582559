use std::sync::atomic::{AtomicBool, Ordering};

use crate::view::ControlId;
use crate::ElectionCall;

/// How an action interacts with the session's [`PendingFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolicy {
    /// Takes the flag and keeps it after success. A voter votes once per session.
    OneShot,
    /// Takes the flag and releases it once the transaction settles.
    Repeatable,
    /// Never looks at the flag.
    Unguarded,
}

impl GuardPolicy {
    /// Returns true if the action must take the flag before sending.
    pub fn is_guarded(&self) -> bool {
        !matches!(self, GuardPolicy::Unguarded)
    }

    /// Returns true if the flag is cleared after a confirmed transaction.
    pub fn releases_on_success(&self) -> bool {
        matches!(self, GuardPolicy::Repeatable)
    }
}

impl ElectionCall {
    /// Guard policy of each action.
    ///
    /// Registering voters and resetting the election are deliberately left
    /// outside the guard.
    pub fn guard_policy(&self) -> GuardPolicy {
        match self {
            ElectionCall::Vote { .. } => GuardPolicy::OneShot,
            ElectionCall::EndElection | ElectionCall::RemoveCandidate { .. } => {
                GuardPolicy::Repeatable
            }
            ElectionCall::RegisterVoter { .. } | ElectionCall::ResetElection => {
                GuardPolicy::Unguarded
            }
        }
    }

    /// The control that triggers this action, if it has one.
    pub fn control(&self) -> Option<ControlId> {
        match self {
            ElectionCall::Vote { .. } => Some(ControlId::Vote),
            ElectionCall::EndElection => Some(ControlId::EndElection),
            ElectionCall::RemoveCandidate { .. } => Some(ControlId::RemoveCandidate),
            ElectionCall::RegisterVoter { .. } | ElectionCall::ResetElection => None,
        }
    }

    /// Whether the view is re-rendered after the transaction is confirmed.
    pub fn rerenders_on_success(&self) -> bool {
        matches!(self, ElectionCall::RemoveCandidate { .. })
    }
}

/// The single transaction-pending flag shared by all guarded actions.
#[derive(Debug, Default)]
pub struct PendingFlag(AtomicBool);

impl PendingFlag {
    /// Sets the flag. Returns false, leaving it untouched, if it was already set.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Sets the flag and returns a guard that clears it again when dropped,
    /// or `None` if the flag was already set.
    ///
    /// Dropping the guard covers failed transactions as well as an action whose
    /// future is dropped before the transaction settles.
    pub fn acquire(&self) -> Option<PendingGuard<'_>> {
        self.try_acquire().then(|| PendingGuard {
            flag: self,
            armed: true,
        })
    }

    /// Clears the flag.
    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Returns true while a guarded transaction holds the flag.
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds the [`PendingFlag`] for one guarded action.
#[must_use = "dropping the guard clears the pending flag"]
#[derive(Debug)]
pub struct PendingGuard<'a> {
    flag: &'a PendingFlag,
    armed: bool,
}

impl PendingGuard<'_> {
    /// Leaves the flag set for the rest of the session.
    pub fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.flag.release();
        }
    }
}
