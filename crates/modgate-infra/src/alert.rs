//! Alert sink that reports through the tracing pipeline.
//!
//! Alerts are emitted as error events carrying `alert = true`, so a log
//! shipper can route them to paging without a separate integration.

use async_trait::async_trait;
use modgate_core::{Alert, AlertSeverity, AlertSink};

pub struct LogAlertSink {
    host: String,
}

impl LogAlertSink {
    pub fn new() -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());
        Self { host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Default for LogAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn raise(&self, alert: Alert) {
        let details = alert.details.to_string();
        match alert.severity {
            AlertSeverity::Critical => tracing::error!(
                alert = true,
                alert_name = %alert.name,
                severity = "critical",
                host = %self.host,
                raised_at = %alert.raised_at,
                details = %details,
                "{}",
                alert.summary
            ),
            AlertSeverity::Warning => tracing::warn!(
                alert = true,
                alert_name = %alert.name,
                severity = "warning",
                host = %self.host,
                raised_at = %alert.raised_at,
                details = %details,
                "{}",
                alert.summary
            ),
        }
    }
}
