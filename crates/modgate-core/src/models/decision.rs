use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

pub const REASON_TEXT_TOXIC: &str = "Content contains highly toxic language";
pub const REASON_TEXT_APPROVED: &str = "Content passed toxicity check";
pub const REASON_TEXT_REVIEW: &str = "Content requires human review";
pub const REASON_IMAGE_REJECTED: &str = "Image contains inappropriate content";
pub const REASON_IMAGE_APPROVED: &str = "Image passed moderation checks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationOutcome {
    Approved,
    Rejected,
    PendingHumanReview,
}

impl Display for ModerationOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ModerationOutcome::Approved => write!(f, "APPROVED"),
            ModerationOutcome::Rejected => write!(f, "REJECTED"),
            ModerationOutcome::PendingHumanReview => write!(f, "PENDING_HUMAN_REVIEW"),
        }
    }
}

/// Terminal artifact of a workflow execution. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationDecision {
    #[serde(rename = "decision")]
    pub outcome: ModerationOutcome,
    pub reason: String,
    /// Execution start time
    pub timestamp: DateTime<Utc>,
}

impl ModerationDecision {
    pub fn new(outcome: ModerationOutcome, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            outcome,
            reason: reason.into(),
            timestamp,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.outcome == ModerationOutcome::Rejected
    }
}
