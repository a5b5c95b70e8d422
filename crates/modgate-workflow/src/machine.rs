//! Shared state-machine vocabulary.

use thiserror::Error;

/// Name of the non-decision terminal state every workflow shares.
pub const FAILED_STATE: &str = "Failed";

pub trait WorkflowState {
    /// Stable state name, recorded in execution history.
    fn name(&self) -> &'static str;

    fn is_terminal(&self) -> bool;
}

/// An event that the current state does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition from {from} on {event}")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub event: &'static str,
}
