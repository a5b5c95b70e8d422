//! Amazon SQS notification queue.

use async_trait::async_trait;
use aws_sdk_sqs::types::{MessageAttributeValue, MessageSystemAttributeName};
use aws_sdk_sqs::Client;
use std::time::Duration;

use crate::queue::{Delivery, NotificationQueue, QueueError};

pub struct SqsQueue {
    client: Client,
    queue_url: String,
    dead_letter_queue_url: String,
    visibility_timeout: Duration,
    wait_time: Duration,
}

impl SqsQueue {
    pub fn new(
        client: Client,
        queue_url: impl Into<String>,
        dead_letter_queue_url: impl Into<String>,
        visibility_timeout: Duration,
        wait_time: Duration,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            dead_letter_queue_url: dead_letter_queue_url.into(),
            visibility_timeout,
            wait_time,
        }
    }

    pub fn from_config(
        sdk_config: &aws_config::SdkConfig,
        queue_url: impl Into<String>,
        dead_letter_queue_url: impl Into<String>,
        visibility_timeout: Duration,
        wait_time: Duration,
    ) -> Self {
        Self::new(
            Client::new(sdk_config),
            queue_url,
            dead_letter_queue_url,
            visibility_timeout,
            wait_time,
        )
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    async fn delete(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&delivery.receipt_handle)
            .send()
            .await
            .map_err(|e| {
                QueueError::Acknowledge(format!("{}", aws_sdk_sqs::error::DisplayErrorContext(e)))
            })?;
        Ok(())
    }
}

fn string_attribute(value: &str) -> Result<MessageAttributeValue, QueueError> {
    MessageAttributeValue::builder()
        .data_type("String")
        .string_value(value)
        .build()
        .map_err(|e| QueueError::DeadLetter(e.to_string()))
}

#[async_trait]
impl NotificationQueue for SqsQueue {
    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.wait_time.as_secs() as i32)
            .visibility_timeout(self.visibility_timeout.as_secs() as i32)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| {
                QueueError::Receive(format!("{}", aws_sdk_sqs::error::DisplayErrorContext(e)))
            })?;

        let Some(message) = output.messages().first() else {
            return Ok(None);
        };

        let receipt_handle = message
            .receipt_handle()
            .ok_or_else(|| QueueError::InvalidMessage("message has no receipt handle".to_string()))?
            .to_string();
        let message_id = message.message_id().unwrap_or_default().to_string();
        let receive_count = message
            .attributes()
            .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
            .and_then(|count| count.parse::<u32>().ok())
            .unwrap_or(1);

        tracing::debug!(
            message_id = %message_id,
            receive_count = receive_count,
            "Received notification from SQS"
        );

        Ok(Some(Delivery {
            message_id,
            receipt_handle,
            body: message.body().unwrap_or_default().to_string(),
            receive_count,
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.delete(delivery).await
    }

    async fn release(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(&delivery.receipt_handle)
            .visibility_timeout(0)
            .send()
            .await
            .map_err(|e| {
                QueueError::Release(format!("{}", aws_sdk_sqs::error::DisplayErrorContext(e)))
            })?;
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError> {
        self.client
            .send_message()
            .queue_url(&self.dead_letter_queue_url)
            .message_body(&delivery.body)
            .message_attributes("failureReason", string_attribute(reason)?)
            .message_attributes("sourceMessageId", string_attribute(&delivery.message_id)?)
            .message_attributes(
                "receiveCount",
                string_attribute(&delivery.receive_count.to_string())?,
            )
            .send()
            .await
            .map_err(|e| {
                QueueError::DeadLetter(format!("{}", aws_sdk_sqs::error::DisplayErrorContext(e)))
            })?;

        self.delete(delivery).await
    }

    fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }
}
