//! Operational alert seam.
//!
//! Components raise alerts when a failure needs human attention (dead-lettered
//! notifications, failed or timed-out workflow executions). How an alert
//! reaches a person is decided by the [`AlertSink`] implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// A single operational alert.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Stable identifier of the alarm (e.g. `upload-dlq`)
    pub name: String,
    pub severity: AlertSeverity,
    pub summary: String,
    /// Free-form context (message id, execution id, error text)
    pub details: serde_json::Value,
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        name: impl Into<String>,
        severity: AlertSeverity,
        summary: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            severity,
            summary: summary.into(),
            details,
            raised_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Raise an alert. Delivery is best-effort and never fails the caller.
    async fn raise(&self, alert: Alert);
}
