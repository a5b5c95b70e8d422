//! In-process notification queue.
//!
//! Emulates the SQS semantics the consumer relies on: one message per receive,
//! a visibility window after which an unacknowledged message reappears, a
//! per-message receive count and a dead-letter list. Used for local
//! development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::queue::{Delivery, NotificationQueue, QueueError};

/// A message moved to the dead-letter list.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub message_id: String,
    pub body: String,
    pub reason: String,
    pub receive_count: u32,
    pub dead_lettered_at: DateTime<Utc>,
}

struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: u32,
    visible_at: Instant,
    receipt_handle: Option<String>,
}

#[derive(Default)]
struct QueueState {
    messages: VecDeque<StoredMessage>,
    dead_letters: Vec<DeadLetter>,
}

impl QueueState {
    fn position(&self, receipt_handle: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
    }

    fn next_visible_at(&self) -> Option<Instant> {
        self.messages.iter().map(|m| m.visible_at).min()
    }
}

pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    visibility_timeout: Duration,
    wait_time: Duration,
}

impl InMemoryQueue {
    pub fn new(visibility_timeout: Duration, wait_time: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            visibility_timeout,
            wait_time,
        }
    }

    /// Enqueue a message body and return its message id.
    pub async fn send(&self, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.state.lock().await.messages.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: body.into(),
            receive_count: 0,
            visible_at: Instant::now(),
            receipt_handle: None,
        });
        self.notify.notify_one();
        message_id
    }

    /// Messages still on the live queue, in flight or not.
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().await.dead_letters.clone()
    }
}

#[async_trait]
impl NotificationQueue for InMemoryQueue {
    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let deadline = Instant::now() + self.wait_time;

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_visible_at = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                if let Some(message) = state.messages.iter_mut().find(|m| m.visible_at <= now) {
                    let receipt_handle = Uuid::new_v4().to_string();
                    message.receive_count += 1;
                    message.visible_at = now + self.visibility_timeout;
                    message.receipt_handle = Some(receipt_handle.clone());
                    return Ok(Some(Delivery {
                        message_id: message.message_id.clone(),
                        receipt_handle,
                        body: message.body.clone(),
                        receive_count: message.receive_count,
                    }));
                }
                state.next_visible_at()
            };

            if Instant::now() >= deadline {
                return Ok(None);
            }
            let wake_at = next_visible_at.map_or(deadline, |at| at.min(deadline));

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let index = state.position(&delivery.receipt_handle).ok_or_else(|| {
            QueueError::Acknowledge(format!(
                "receipt for message {} is no longer valid",
                delivery.message_id
            ))
        })?;
        state.messages.remove(index);
        Ok(())
    }

    async fn release(&self, delivery: &Delivery) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            let index = state.position(&delivery.receipt_handle).ok_or_else(|| {
                QueueError::Release(format!(
                    "receipt for message {} is no longer valid",
                    delivery.message_id
                ))
            })?;
            let message = &mut state.messages[index];
            message.visible_at = Instant::now();
            message.receipt_handle = None;
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let index = state.position(&delivery.receipt_handle).ok_or_else(|| {
            QueueError::DeadLetter(format!(
                "receipt for message {} is no longer valid",
                delivery.message_id
            ))
        })?;
        let message = state.messages.remove(index).ok_or_else(|| {
            QueueError::DeadLetter(format!("message {} vanished", delivery.message_id))
        })?;
        state.dead_letters.push(DeadLetter {
            message_id: message.message_id,
            body: message.body,
            reason: reason.to_string(),
            receive_count: message.receive_count,
            dead_lettered_at: Utc::now(),
        });
        Ok(())
    }

    fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> InMemoryQueue {
        InMemoryQueue::new(Duration::from_secs(30), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn empty_receive_times_out() {
        assert!(queue().receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn received_message_is_hidden_until_released() {
        let queue = queue();
        let id = queue.send("body").await;

        let first = queue.receive().await.unwrap().unwrap();
        assert_eq!(first.message_id, id);
        assert_eq!(first.receive_count, 1);
        assert!(queue.receive().await.unwrap().is_none());

        queue.release(&first).await.unwrap();
        let second = queue.receive().await.unwrap().unwrap();
        assert_eq!(second.message_id, id);
        assert_eq!(second.receive_count, 2);
        assert_ne!(second.receipt_handle, first.receipt_handle);
    }

    #[tokio::test]
    async fn ack_removes_message() {
        let queue = queue();
        queue.send("body").await;
        let delivery = queue.receive().await.unwrap().unwrap();
        queue.ack(&delivery).await.unwrap();
        assert!(queue.is_empty().await);
        assert!(queue.ack(&delivery).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn unacked_message_reappears_after_visibility_timeout() {
        let queue = InMemoryQueue::new(Duration::from_secs(30), Duration::from_secs(60));
        queue.send("body").await;
        let first = queue.receive().await.unwrap().unwrap();

        let second = queue.receive().await.unwrap().unwrap();
        assert_eq!(second.receive_count, 2);
        // The first receipt is stale once the message was received again.
        assert!(queue.ack(&first).await.is_err());
        queue.ack(&second).await.unwrap();
    }

    #[tokio::test]
    async fn dead_letter_moves_message_with_reason() {
        let queue = queue();
        queue.send("body").await;
        let delivery = queue.receive().await.unwrap().unwrap();

        queue.dead_letter(&delivery, "UNSUPPORTED_CONTENT_TYPE").await.unwrap();

        assert!(queue.is_empty().await);
        let dead = queue.dead_letters().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].body, "body");
        assert_eq!(dead[0].reason, "UNSUPPORTED_CONTENT_TYPE");
        assert_eq!(dead[0].receive_count, 1);
    }

    #[tokio::test]
    async fn receive_wakes_on_send() {
        let queue = std::sync::Arc::new(InMemoryQueue::new(
            Duration::from_secs(30),
            Duration::from_secs(5),
        ));
        let receiver = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.receive().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.send("late").await;

        let delivery = receiver.await.unwrap().unwrap().unwrap();
        assert_eq!(delivery.body, "late");
    }
}
