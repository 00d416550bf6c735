//! Transfer pipeline states.
//!
//! # State Transitions
//! ```text
//! Idle → Validating → Building → Signing → Broadcasting → Confirming → Done
//!   any non-terminal state → Failed
//! ```
//! No state is re-entered; a retry is a new run.

use std::fmt;
use thiserror::Error;

use crate::blockchain::types::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    Idle,
    Validating,
    Building,
    Signing,
    Broadcasting,
    Confirming,
    Done,
    Failed,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Broadcasting => "broadcasting",
            Self::Confirming => "confirming",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn position(&self) -> Option<u8> {
        match self {
            Self::Idle => Some(0),
            Self::Validating => Some(1),
            Self::Building => Some(2),
            Self::Signing => Some(3),
            Self::Broadcasting => Some(4),
            Self::Confirming => Some(5),
            Self::Done => Some(6),
            Self::Failed => None,
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: TransferState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.position(), next.position()) {
            (_, None) => true,
            (Some(current), Some(next)) => next == current + 1,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run: the state it failed in and the originating cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transfer failed while {stage}: {error}")]
pub struct TransferFailure {
    pub stage: TransferState,
    #[source]
    pub error: TransferError,
}

/// Forward-only state tracker for one pipeline run.
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: TransferState,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: TransferState::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> TransferState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {} → {}",
            self.state,
            next
        );
        tracing::info!(from = %self.state, to = %next, "Transfer state changed");
        self.state = next;
    }

    /// Move to `Failed`, keeping the state the error occurred in.
    pub(crate) fn fail(&mut self, error: TransferError) -> TransferFailure {
        let stage = self.state;
        tracing::error!(stage = %stage, error = %error, "Transfer failed");
        self.state = TransferState::Failed;
        TransferFailure { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        use TransferState::*;
        assert!(Idle.can_advance_to(Validating));
        assert!(Confirming.can_advance_to(Done));
        assert!(!Idle.can_advance_to(Building));
        assert!(!Signing.can_advance_to(Building));
        assert!(!Building.can_advance_to(Building));
        assert!(!Done.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Validating));
    }

    #[test]
    fn test_failed_reachable_from_any_live_state() {
        use TransferState::*;
        for state in [Idle, Validating, Building, Signing, Broadcasting, Confirming] {
            assert!(state.can_advance_to(Failed), "{state}");
        }
    }

    #[test]
    fn test_fail_records_stage() {
        let mut machine = StateMachine::new();
        machine.advance(TransferState::Validating);
        machine.advance(TransferState::Building);
        let failure = machine.fail(TransferError::rpc("eth_gasPrice", "boom"));
        assert_eq!(failure.stage, TransferState::Building);
        assert_eq!(machine.state(), TransferState::Failed);
        assert!(failure.to_string().starts_with("transfer failed while building"));
    }
}
