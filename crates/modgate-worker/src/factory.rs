//! Queue factory for creating queue instances based on configuration

use modgate_core::{QueueBackend, QueueConfig};
use std::sync::Arc;

use crate::memory::InMemoryQueue;
use crate::queue::{NotificationQueue, QueueError};

/// Create a notification queue instance based on configuration
///
/// `region` is only consulted by the SQS backend.
pub async fn create_queue(
    config: &QueueConfig,
    region: Option<String>,
) -> Result<Arc<dyn NotificationQueue>, QueueError> {
    match config.backend {
        QueueBackend::Memory => {
            tracing::info!(
                visibility_timeout_secs = config.visibility_timeout_secs,
                "Using in-memory notification queue"
            );
            Ok(Arc::new(InMemoryQueue::new(
                config.visibility_timeout(),
                config.wait_time(),
            )))
        }
        QueueBackend::Sqs => create_sqs_queue(config, region).await,
    }
}

#[cfg(feature = "queue-sqs")]
async fn create_sqs_queue(
    config: &QueueConfig,
    region: Option<String>,
) -> Result<Arc<dyn NotificationQueue>, QueueError> {
    use aws_config::BehaviorVersion;

    let queue_url = config
        .queue_url
        .clone()
        .ok_or_else(|| QueueError::Configuration("UPLOAD_QUEUE_URL is required for SQS".to_string()))?;
    let dead_letter_queue_url = config.dead_letter_queue_url.clone().ok_or_else(|| {
        QueueError::Configuration("UPLOAD_DLQ_URL is required for SQS".to_string())
    })?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    let sdk_config = loader.load().await;

    tracing::info!(queue_url = %queue_url, "Using SQS notification queue");
    Ok(Arc::new(crate::sqs::SqsQueue::from_config(
        &sdk_config,
        queue_url,
        dead_letter_queue_url,
        config.visibility_timeout(),
        config.wait_time(),
    )))
}

#[cfg(not(feature = "queue-sqs"))]
async fn create_sqs_queue(
    _config: &QueueConfig,
    _region: Option<String>,
) -> Result<Arc<dyn NotificationQueue>, QueueError> {
    Err(QueueError::Configuration(
        "SQS queue support is not compiled in. Enable the 'queue-sqs' feature".to_string(),
    ))
}
