use modgate_core::{ErrorMetadata, LogLevel};
use modgate_evaluators::EvaluatorError;
use std::time::Duration;
use thiserror::Error;

use crate::machine::InvalidTransition;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An evaluator call failed; the execution ends without a decision.
    #[error("Evaluator failure: {0}")]
    EvaluatorFailure(#[from] EvaluatorError),

    #[error("Execution timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The engine did not accept a new execution.
    #[error("Failed to start {workflow}: {message}")]
    StartFailure { workflow: String, message: String },

    #[error("Execution stopped in non-decision state {0}")]
    NoDecision(&'static str),
}

impl ErrorMetadata for WorkflowError {
    fn http_status_code(&self) -> u16 {
        match self {
            WorkflowError::EvaluatorFailure(_) => 502,
            WorkflowError::TimedOut(_) => 504,
            WorkflowError::StartFailure { .. } => 503,
            WorkflowError::InvalidTransition(_) | WorkflowError::NoDecision(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::EvaluatorFailure(_) => "EVALUATOR_FAILURE",
            WorkflowError::TimedOut(_) => "WORKFLOW_TIMED_OUT",
            WorkflowError::InvalidTransition(_) => "INVALID_TRANSITION",
            WorkflowError::StartFailure { .. } => "WORKFLOW_START_FAILURE",
            WorkflowError::NoDecision(_) => "NO_DECISION",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, WorkflowError::StartFailure { .. })
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            WorkflowError::EvaluatorFailure(_) | WorkflowError::TimedOut(_) => {
                Some("Re-upload the object to moderate it again")
            }
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }
}
