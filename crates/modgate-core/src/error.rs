//! Error types module
//!
//! `ModerationError` is the failure taxonomy of the moderation path: every
//! variant fails the queue message it was raised for, which is then subject to
//! redelivery and eventually dead-lettering. `AppError` covers the HTTP surface.
//! Both self-describe through [`ErrorMetadata`].

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error reporting - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "MALFORMED_EVENT")
    fn error_code(&self) -> &'static str;

    /// Whether this error may go away on retry
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client or operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failures raised while turning an upload notification into a workflow execution.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// The notification lacks a required field or cannot be parsed.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The object is neither text nor image content.
    #[error("Unsupported content type for object {object_key}")]
    UnsupportedContentType { object_key: String },

    #[error("Failed to fetch payload for {object_key}: {message}")]
    PayloadFetch { object_key: String, message: String },

    #[error("Payload of {object_key} is not valid UTF-8")]
    PayloadDecode { object_key: String },

    /// A workflow engine did not accept the execution.
    #[error("Failed to start {workflow} workflow: {message}")]
    WorkflowStart { workflow: String, message: String },
}

impl ModerationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ModerationError::MalformedEvent(message.into())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, log_level).
fn moderation_error_static_metadata(
    err: &ModerationError,
) -> (u16, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        ModerationError::MalformedEvent(_) => (
            400,
            "MALFORMED_EVENT",
            false,
            Some("Inspect the dead-letter queue for the raw notification"),
            LogLevel::Warn,
        ),
        ModerationError::UnsupportedContentType { .. } => (
            415,
            "UNSUPPORTED_CONTENT_TYPE",
            false,
            Some("Upload text (.txt, .md) or image content"),
            LogLevel::Warn,
        ),
        ModerationError::PayloadFetch { .. } => (
            502,
            "PAYLOAD_FETCH_FAILED",
            true,
            Some("Check bucket permissions and object existence"),
            LogLevel::Error,
        ),
        ModerationError::PayloadDecode { .. } => (
            422,
            "PAYLOAD_DECODE_FAILED",
            false,
            Some("Text uploads must be UTF-8 encoded"),
            LogLevel::Warn,
        ),
        ModerationError::WorkflowStart { .. } => (
            503,
            "WORKFLOW_START_FAILED",
            true,
            Some("Check workflow engine health"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for ModerationError {
    fn http_status_code(&self) -> u16 {
        moderation_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        moderation_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        moderation_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        moderation_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        moderation_error_static_metadata(self).4
    }
}

/// Errors returned by the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (u16, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }
}
