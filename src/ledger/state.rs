//! Ledger Mutation State Definitions
//!
//! Lifecycle of a single deduct or recharge:
//!
//! ```text
//! STARTED ──▶ VALIDATED ──▶ COMMITTED
//!    │             │
//!    │             └──────▶ ABORTED(reason)
//!    └──────▶ REJECTED_PRECHECK(reason)
//! ```
//!
//! Only terminal states are externally observable.

use std::fmt;

/// Mutation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationState {
    /// Request accepted by the engine
    Started,
    /// Input validated, about to open the unit of work
    Validated,
    /// Terminal: balance update and log append are durable
    Committed,
    /// Terminal: unit of work rolled back
    Aborted,
    /// Terminal: rejected before any mutation was attempted
    RejectedPrecheck,
}

impl MutationState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MutationState::Committed | MutationState::Aborted | MutationState::RejectedPrecheck
        )
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: MutationState) -> bool {
        matches!(
            (self, next),
            (MutationState::Started, MutationState::Validated)
                | (MutationState::Started, MutationState::RejectedPrecheck)
                | (MutationState::Validated, MutationState::RejectedPrecheck)
                | (MutationState::Validated, MutationState::Committed)
                | (MutationState::Validated, MutationState::Aborted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationState::Started => "STARTED",
            MutationState::Validated => "VALIDATED",
            MutationState::Committed => "COMMITTED",
            MutationState::Aborted => "ABORTED",
            MutationState::RejectedPrecheck => "REJECTED_PRECHECK",
        }
    }
}

impl fmt::Display for MutationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one mutation through its states and logs each transition.
pub(crate) struct MutationTracker {
    op: &'static str,
    user_id: i64,
    state: MutationState,
}

impl MutationTracker {
    pub(crate) fn start(op: &'static str, user_id: i64) -> Self {
        tracing::debug!(op, user_id, state = %MutationState::Started, "ledger mutation");
        Self {
            op,
            user_id,
            state: MutationState::Started,
        }
    }

    pub(crate) fn state(&self) -> MutationState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: MutationState, detail: &str) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
        match next {
            MutationState::Aborted => tracing::warn!(
                op = self.op,
                user_id = self.user_id,
                state = %next,
                detail,
                "ledger mutation aborted"
            ),
            MutationState::RejectedPrecheck => tracing::info!(
                op = self.op,
                user_id = self.user_id,
                state = %next,
                detail,
                "ledger mutation rejected"
            ),
            _ => tracing::debug!(
                op = self.op,
                user_id = self.user_id,
                state = %next,
                detail,
                "ledger mutation"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(MutationState::Committed.is_terminal());
        assert!(MutationState::Aborted.is_terminal());
        assert!(MutationState::RejectedPrecheck.is_terminal());
        assert!(!MutationState::Started.is_terminal());
        assert!(!MutationState::Validated.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(MutationState::Started.can_transition_to(MutationState::Validated));
        assert!(MutationState::Started.can_transition_to(MutationState::RejectedPrecheck));
        assert!(MutationState::Validated.can_transition_to(MutationState::Committed));
        assert!(MutationState::Validated.can_transition_to(MutationState::Aborted));
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        let all = [
            MutationState::Started,
            MutationState::Validated,
            MutationState::Committed,
            MutationState::Aborted,
            MutationState::RejectedPrecheck,
        ];
        for from in [
            MutationState::Committed,
            MutationState::Aborted,
            MutationState::RejectedPrecheck,
        ] {
            for to in all {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_started_cannot_commit_directly() {
        assert!(!MutationState::Started.can_transition_to(MutationState::Committed));
        assert!(!MutationState::Started.can_transition_to(MutationState::Aborted));
    }

    #[test]
    fn test_tracker_walks_happy_path() {
        let mut t = MutationTracker::start("deduct", 1);
        t.advance(MutationState::Validated, "");
        t.advance(MutationState::Committed, "tx_1");
        assert_eq!(t.state(), MutationState::Committed);
    }

    #[test]
    fn test_display() {
        assert_eq!(MutationState::RejectedPrecheck.to_string(), "REJECTED_PRECHECK");
    }
}
