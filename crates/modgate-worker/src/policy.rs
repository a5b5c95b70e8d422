//! Redelivery / dead-letter policy.

/// What to do with a notification whose processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Redeliver,
    DeadLetter,
}

/// Bounds how often a failing notification is redelivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_redeliveries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_redeliveries: 1,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_redeliveries: u32) -> Self {
        Self { max_redeliveries }
    }

    /// `receive_count` includes the delivery that just failed.
    pub fn disposition(&self, receive_count: u32) -> Disposition {
        if receive_count <= self.max_redeliveries {
            Disposition::Redeliver
        } else {
            Disposition::DeadLetter
        }
    }
}
