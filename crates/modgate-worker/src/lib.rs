//! Modgate Worker
//!
//! Consumes upload notifications from the ingestion queue, turns each into a
//! workflow execution through the [`Dispatcher`], and applies the
//! redelivery / dead-letter policy to notifications that fail.
//!
//! Shutdown: [`QueueConsumer::shutdown`] stops the consumer loops from
//! receiving new messages and waits for the delivery being processed. It does
//! not cancel workflow executions that were already started.

pub mod consumer;
pub mod dispatcher;
pub mod factory;
pub mod memory;
pub mod policy;
pub mod queue;
#[cfg(feature = "queue-sqs")]
pub mod sqs;

pub use consumer::{
    DeliveryFailure, DeliveryOutcome, DeliveryProcessor, QueueConsumer, UPLOAD_DLQ_ALERT,
};
pub use dispatcher::{DispatchReport, Dispatcher, SkippedEvent, StartedExecution};
pub use factory::create_queue;
pub use memory::{DeadLetter, InMemoryQueue};
pub use policy::{Disposition, RetryPolicy};
pub use queue::{Delivery, NotificationQueue, QueueError};
#[cfg(feature = "queue-sqs")]
pub use sqs::SqsQueue;
