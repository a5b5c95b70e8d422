//! Modgate Core Library
//!
//! This crate provides the domain models, content classifier, error types,
//! configuration and alerting seam shared across all modgate components.

pub mod alert;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-export commonly used types
pub use alert::{Alert, AlertSeverity, AlertSink};
pub use classifier::{ContentClassifier, ContentKind};
pub use config::{
    BaseConfig, Config, ModerationConfig, QueueBackend, QueueConfig, StorageConfig,
    WorkflowConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel, ModerationError};
pub use storage_types::StorageBackend;
