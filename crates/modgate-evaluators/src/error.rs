use modgate_core::{ErrorMetadata, LogLevel};
use thiserror::Error;

/// Failure of an external content-analysis call.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The service call itself failed (network, throttling, permissions).
    #[error("{evaluator} call failed: {message}")]
    Service {
        evaluator: &'static str,
        message: String,
    },

    /// The service answered but without the data a decision needs.
    #[error("{evaluator} returned an unusable response: {message}")]
    InvalidResponse {
        evaluator: &'static str,
        message: String,
    },

    #[error("Invalid evaluator input: {0}")]
    InvalidInput(String),
}

impl EvaluatorError {
    pub fn service(evaluator: &'static str, message: impl Into<String>) -> Self {
        EvaluatorError::Service {
            evaluator,
            message: message.into(),
        }
    }

    pub fn invalid_response(evaluator: &'static str, message: impl Into<String>) -> Self {
        EvaluatorError::InvalidResponse {
            evaluator,
            message: message.into(),
        }
    }
}

impl ErrorMetadata for EvaluatorError {
    fn http_status_code(&self) -> u16 {
        match self {
            EvaluatorError::InvalidInput(_) => 400,
            _ => 502,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EvaluatorError::Service { .. } => "EVALUATOR_SERVICE_ERROR",
            EvaluatorError::InvalidResponse { .. } => "EVALUATOR_INVALID_RESPONSE",
            EvaluatorError::InvalidInput(_) => "EVALUATOR_INVALID_INPUT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, EvaluatorError::Service { .. })
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            EvaluatorError::Service { .. } => Some("Check service quotas and IAM permissions"),
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            EvaluatorError::InvalidInput(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
