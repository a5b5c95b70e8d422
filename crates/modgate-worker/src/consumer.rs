//! Queue consumer pool.
//!
//! Each consumer loop receives one notification at a time, dispatches it under a
//! timeout equal to the queue visibility window, and settles it: ack on
//! success, release for redelivery or dead-letter on failure depending on the
//! [`RetryPolicy`].

use modgate_core::{Alert, AlertSeverity, AlertSink, ErrorMetadata, LogLevel, ModerationError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::policy::{Disposition, RetryPolicy};
use crate::queue::{Delivery, NotificationQueue, QueueError};

/// Alert raised whenever a notification reaches the dead-letter queue.
pub const UPLOAD_DLQ_ALERT: &str = "upload-dlq";

/// Pause after a failed receive before polling again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum DeliveryFailure {
    #[error(transparent)]
    Dispatch(#[from] ModerationError),

    #[error("Processing exceeded the visibility window of {0:?}")]
    VisibilityTimeout(Duration),
}

impl ErrorMetadata for DeliveryFailure {
    fn http_status_code(&self) -> u16 {
        match self {
            DeliveryFailure::Dispatch(e) => e.http_status_code(),
            DeliveryFailure::VisibilityTimeout(_) => 504,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            DeliveryFailure::Dispatch(e) => e.error_code(),
            DeliveryFailure::VisibilityTimeout(_) => "VISIBILITY_TIMEOUT_EXCEEDED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            DeliveryFailure::Dispatch(e) => e.is_recoverable(),
            DeliveryFailure::VisibilityTimeout(_) => true,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            DeliveryFailure::Dispatch(e) => e.suggested_action(),
            DeliveryFailure::VisibilityTimeout(_) => {
                Some("Check storage and workflow engine latency")
            }
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            DeliveryFailure::Dispatch(e) => e.log_level(),
            DeliveryFailure::VisibilityTimeout(_) => LogLevel::Warn,
        }
    }
}

/// How a delivery was settled.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Acked(DispatchReport),
    Released(DeliveryFailure),
    DeadLettered(DeliveryFailure),
}

/// Receives, dispatches and settles single deliveries.
#[derive(Clone)]
pub struct DeliveryProcessor {
    queue: Arc<dyn NotificationQueue>,
    dispatcher: Arc<Dispatcher>,
    alerts: Arc<dyn AlertSink>,
    policy: RetryPolicy,
}

impl DeliveryProcessor {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        dispatcher: Arc<Dispatcher>,
        alerts: Arc<dyn AlertSink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            alerts,
            policy,
        }
    }

    /// Receive at most one delivery and process it.
    pub async fn poll_once(&self) -> Result<Option<DeliveryOutcome>, QueueError> {
        let Some(delivery) = self.queue.receive().await? else {
            return Ok(None);
        };
        self.process(delivery).await.map(Some)
    }

    #[tracing::instrument(
        skip(self, delivery),
        fields(message_id = %delivery.message_id, receive_count = delivery.receive_count)
    )]
    pub async fn process(&self, delivery: Delivery) -> Result<DeliveryOutcome, QueueError> {
        let window = self.queue.visibility_timeout();
        let result =
            match tokio::time::timeout(window, self.dispatcher.dispatch(&delivery.body)).await {
                Ok(Ok(report)) => Ok(report),
                Ok(Err(e)) => Err(DeliveryFailure::Dispatch(e)),
                Err(_) => Err(DeliveryFailure::VisibilityTimeout(window)),
            };

        match result {
            Ok(report) => {
                self.queue.ack(&delivery).await?;
                tracing::info!(
                    started = report.started.len(),
                    skipped = report.skipped.len(),
                    "Notification processed"
                );
                Ok(DeliveryOutcome::Acked(report))
            }
            Err(failure) => self.settle_failure(&delivery, failure).await,
        }
    }

    async fn settle_failure(
        &self,
        delivery: &Delivery,
        failure: DeliveryFailure,
    ) -> Result<DeliveryOutcome, QueueError> {
        let disposition = self.policy.disposition(delivery.receive_count);
        log_failure(&failure, disposition);

        match disposition {
            Disposition::Redeliver => {
                self.queue.release(delivery).await?;
                Ok(DeliveryOutcome::Released(failure))
            }
            Disposition::DeadLetter => {
                let reason = format!("{}: {}", failure.error_code(), failure);
                self.queue.dead_letter(delivery, &reason).await?;

                self.alerts
                    .raise(Alert::new(
                        UPLOAD_DLQ_ALERT,
                        AlertSeverity::Critical,
                        format!(
                            "Upload notification {} moved to the dead-letter queue",
                            delivery.message_id
                        ),
                        json!({
                            "messageId": delivery.message_id,
                            "receiveCount": delivery.receive_count,
                            "errorCode": failure.error_code(),
                            "error": failure.to_string(),
                        }),
                    ))
                    .await;

                Ok(DeliveryOutcome::DeadLettered(failure))
            }
        }
    }
}

fn log_failure(failure: &DeliveryFailure, disposition: Disposition) {
    let disposition = match disposition {
        Disposition::Redeliver => "redeliver",
        Disposition::DeadLetter => "dead_letter",
    };
    match failure.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %failure,
            error_code = failure.error_code(),
            disposition,
            "Notification processing failed"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %failure,
            error_code = failure.error_code(),
            disposition,
            "Notification processing failed"
        ),
        LogLevel::Error => tracing::error!(
            error = %failure,
            error_code = failure.error_code(),
            recoverable = failure.is_recoverable(),
            disposition,
            "Notification processing failed"
        ),
    }
}

/// Pool of consumer loops sharing one queue.
pub struct QueueConsumer {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl QueueConsumer {
    /// Spawn `consumers` loops (at least one).
    pub fn start(processor: DeliveryProcessor, consumers: usize) -> Self {
        let consumers = consumers.max(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handles = (0..consumers)
            .map(|worker| {
                let processor = processor.clone();
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(Self::consume(worker, processor, shutdown_rx))
            })
            .collect();

        tracing::info!(consumers, "Queue consumers started");

        Self {
            shutdown_tx,
            handles,
        }
    }

    async fn consume(
        worker: usize,
        processor: DeliveryProcessor,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                received = processor.queue.receive() => match received {
                    Ok(Some(delivery)) => {
                        if let Err(e) = processor.process(delivery).await {
                            tracing::error!(worker, error = %e, "Failed to settle notification");
                        }
                    }
                    Ok(None) => {
                        tracing::trace!(worker, "No notifications available");
                    }
                    Err(e) => {
                        tracing::error!(worker, error = %e, "Failed to receive from queue");
                        tokio::select! {
                            _ = shutdown_rx.changed() => break,
                            _ = tokio::time::sleep(RECEIVE_ERROR_BACKOFF) => {}
                        }
                    }
                }
            }
        }

        tracing::debug!(worker, "Queue consumer stopped");
    }

    /// Stop receiving and wait for in-flight deliveries to settle.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Queue consumer task ended abnormally");
            }
        }
        tracing::info!("Queue consumers stopped");
    }
}
