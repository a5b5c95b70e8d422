//! Notification queue abstraction.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to receive from queue: {0}")]
    Receive(String),

    #[error("Failed to acknowledge message: {0}")]
    Acknowledge(String),

    #[error("Failed to release message: {0}")]
    Release(String),

    #[error("Failed to dead-letter message: {0}")]
    DeadLetter(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Queue configuration error: {0}")]
    Configuration(String),
}

/// One received notification, in flight until acked, released or dead-lettered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: String,
    /// Handle identifying this particular receive
    pub receipt_handle: String,
    pub body: String,
    /// How many times the message has been received, this delivery included
    pub receive_count: u32,
}

/// At-least-once queue with a visibility window and an explicit dead-letter channel.
///
/// Messages are received one at a time. While in flight a message is hidden
/// from other consumers for [`NotificationQueue::visibility_timeout`].
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Wait (long poll) for the next message. `None` when the wait elapsed empty.
    async fn receive(&self) -> Result<Option<Delivery>, QueueError>;

    /// Remove a successfully processed message.
    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Make a failed message visible again for redelivery.
    async fn release(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Copy the message and the failure reason to the dead-letter channel,
    /// then remove it from the live queue.
    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError>;

    fn visibility_timeout(&self) -> Duration;
}
