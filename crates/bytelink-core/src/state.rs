//! Run state machine
//!
//! `NotStarted → Deploying(0) → … → Deploying(n-1) → Succeeded`, with any
//! non-terminal state allowed to move to `Aborted`. An empty plan goes
//! straight from `NotStarted` to `Succeeded`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "step")]
pub enum RunState {
    NotStarted,
    /// Working on the step at this position of the execution order
    Deploying(usize),
    Succeeded,
    Aborted,
}

/// Illegal state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal run state transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: RunState,
    pub to: RunState,
}

impl RunState {
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Aborted)
    }

    /// Check whether `self → to` is allowed
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        use RunState::{Aborted, Deploying, NotStarted, Succeeded};
        match (self, to) {
            (NotStarted, Deploying(0) | Succeeded | Aborted) => true,
            (Deploying(i), Deploying(j)) => j == i + 1,
            (Deploying(_), Succeeded | Aborted) => true,
            _ => false,
        }
    }

    /// Move to `to`
    ///
    /// # Errors
    /// Returns [`TransitionError`] if the move is not allowed
    pub fn advance(&mut self, to: Self) -> Result<(), TransitionError> {
        if !self.can_transition_to(to) {
            return Err(TransitionError { from: *self, to });
        }
        tracing::trace!(from = ?*self, to = ?to, "run state");
        *self = to;
        Ok(())
    }
}
