//! Test doubles shared by dependent crates.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::alert::{Alert, AlertSink};

/// Alert sink that keeps every raised alert for assertions.
#[derive(Clone, Default)]
pub struct RecordingAlertSink {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.alerts().into_iter().map(|a| a.name).collect()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn raise(&self, alert: Alert) {
        self.alerts.lock().unwrap().push(alert);
    }
}
