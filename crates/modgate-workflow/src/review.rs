//! Human review extension point.

use async_trait::async_trait;
use modgate_core::models::TextRequest;

use crate::execution::ExecutionId;

/// Receives text executions that ended in `PendingHumanReview`.
#[async_trait]
pub trait HumanReviewRequester: Send + Sync {
    async fn request_review(
        &self,
        execution_id: &ExecutionId,
        request: &TextRequest,
        toxicity_score: f32,
    );
}

/// Records review requests in the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHumanReviewRequester;

#[async_trait]
impl HumanReviewRequester for LogHumanReviewRequester {
    async fn request_review(
        &self,
        execution_id: &ExecutionId,
        request: &TextRequest,
        toxicity_score: f32,
    ) {
        tracing::warn!(
            execution_id = %execution_id,
            toxicity_score = toxicity_score,
            language_code = %request.language_code,
            text_length = request.text.len(),
            "Content queued for human review"
        );
    }
}
