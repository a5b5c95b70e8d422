//! Text moderation workflow
//!
//! `Start -> EvaluatingToxicity -> EvaluatingDecision -> Approved | Rejected`,
//! with `PendingHumanReview` as a third outcome when the review band is on.
//! Any non-terminal state moves to `Failed` when an evaluator errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modgate_core::models::{
    ModerationDecision, ModerationOutcome, TextRequest, ToxicityEvaluation, REASON_TEXT_APPROVED,
    REASON_TEXT_REVIEW, REASON_TEXT_TOXIC,
};
use modgate_core::ModerationConfig;
use modgate_evaluators::ToxicityEvaluator;
use std::sync::Arc;

use crate::engine::{ExecutionContext, Workflow};
use crate::error::WorkflowError;
use crate::machine::{InvalidTransition, WorkflowState, FAILED_STATE};
use crate::review::HumanReviewRequester;

#[derive(Debug, Clone, PartialEq)]
pub enum TextState {
    Start,
    EvaluatingToxicity,
    EvaluatingDecision { toxicity_score: f32 },
    Approved(ModerationDecision),
    PendingHumanReview(ModerationDecision),
    Rejected(ModerationDecision),
    Failed { error: String },
}

impl TextState {
    pub fn decision(&self) -> Option<&ModerationDecision> {
        match self {
            TextState::Approved(d) | TextState::PendingHumanReview(d) | TextState::Rejected(d) => {
                Some(d)
            }
            _ => None,
        }
    }
}

impl WorkflowState for TextState {
    fn name(&self) -> &'static str {
        match self {
            TextState::Start => "Start",
            TextState::EvaluatingToxicity => "EvaluatingToxicity",
            TextState::EvaluatingDecision { .. } => "EvaluatingDecision",
            TextState::Approved(_) => "Approved",
            TextState::PendingHumanReview(_) => "PendingHumanReview",
            TextState::Rejected(_) => "Rejected",
            TextState::Failed { .. } => FAILED_STATE,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            TextState::Approved(_)
                | TextState::PendingHumanReview(_)
                | TextState::Rejected(_)
                | TextState::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextEvent {
    Begin,
    ToxicityScored(ToxicityEvaluation),
    /// Apply the policy; the decision is stamped with the execution start time.
    Decide { started_at: DateTime<Utc> },
    Fail { error: String },
}

impl TextEvent {
    fn name(&self) -> &'static str {
        match self {
            TextEvent::Begin => "Begin",
            TextEvent::ToxicityScored(_) => "ToxicityScored",
            TextEvent::Decide { .. } => "Decide",
            TextEvent::Fail { .. } => "Fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    HumanReview,
    Reject,
}

/// Score cut-offs. Without a review band the cut is two-way at `reject_threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextModerationPolicy {
    pub reject_threshold: f32,
    /// Lower bound of `[bound, reject_threshold)` routed to human review
    pub human_review_lower_bound: Option<f32>,
}

impl Default for TextModerationPolicy {
    fn default() -> Self {
        Self {
            reject_threshold: 0.9,
            human_review_lower_bound: None,
        }
    }
}

impl TextModerationPolicy {
    pub fn from_config(config: &ModerationConfig) -> Self {
        Self {
            reject_threshold: config.toxicity_threshold,
            human_review_lower_bound: config
                .human_review_enabled
                .then_some(config.human_review_lower_bound),
        }
    }

    pub fn verdict(&self, toxicity_score: f32) -> Verdict {
        if toxicity_score >= self.reject_threshold {
            return Verdict::Reject;
        }
        match self.human_review_lower_bound {
            Some(bound) if toxicity_score >= bound => Verdict::HumanReview,
            _ => Verdict::Approve,
        }
    }
}

/// Pure transition function of the text workflow.
#[derive(Debug, Clone, Default)]
pub struct TextStateMachine {
    policy: TextModerationPolicy,
}

impl TextStateMachine {
    pub fn new(policy: TextModerationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TextModerationPolicy {
        &self.policy
    }

    pub fn transition(
        &self,
        state: &TextState,
        event: TextEvent,
    ) -> Result<TextState, InvalidTransition> {
        let next = match (state, event) {
            (TextState::Start, TextEvent::Begin) => TextState::EvaluatingToxicity,
            (TextState::EvaluatingToxicity, TextEvent::ToxicityScored(evaluation)) => {
                TextState::EvaluatingDecision {
                    toxicity_score: evaluation.toxicity_score,
                }
            }
            (TextState::EvaluatingDecision { toxicity_score }, TextEvent::Decide { started_at }) => {
                match self.policy.verdict(*toxicity_score) {
                    Verdict::Reject => TextState::Rejected(ModerationDecision::new(
                        ModerationOutcome::Rejected,
                        REASON_TEXT_TOXIC,
                        started_at,
                    )),
                    Verdict::HumanReview => TextState::PendingHumanReview(ModerationDecision::new(
                        ModerationOutcome::PendingHumanReview,
                        REASON_TEXT_REVIEW,
                        started_at,
                    )),
                    Verdict::Approve => TextState::Approved(ModerationDecision::new(
                        ModerationOutcome::Approved,
                        REASON_TEXT_APPROVED,
                        started_at,
                    )),
                }
            }
            (current, TextEvent::Fail { error }) if !current.is_terminal() => {
                TextState::Failed { error }
            }
            (current, event) => {
                return Err(InvalidTransition {
                    from: current.name(),
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

/// Text workflow bound to a toxicity evaluator.
pub struct TextWorkflow {
    id: String,
    machine: TextStateMachine,
    evaluator: Arc<dyn ToxicityEvaluator>,
    review: Arc<dyn HumanReviewRequester>,
}

impl TextWorkflow {
    pub fn new(
        id: impl Into<String>,
        machine: TextStateMachine,
        evaluator: Arc<dyn ToxicityEvaluator>,
        review: Arc<dyn HumanReviewRequester>,
    ) -> Self {
        Self {
            id: id.into(),
            machine,
            evaluator,
            review,
        }
    }

    async fn advance(
        &self,
        ctx: &ExecutionContext,
        state: &TextState,
        event: TextEvent,
    ) -> Result<TextState, WorkflowError> {
        let next = self.machine.transition(state, event)?;
        ctx.enter(&next).await;
        Ok(next)
    }
}

#[async_trait]
impl Workflow for TextWorkflow {
    type Input = TextRequest;

    fn id(&self) -> &str {
        &self.id
    }

    async fn run(
        &self,
        input: TextRequest,
        ctx: &ExecutionContext,
    ) -> Result<ModerationDecision, WorkflowError> {
        let state = TextState::Start;
        ctx.enter(&state).await;

        let state = self.advance(ctx, &state, TextEvent::Begin).await?;

        let evaluation = match self
            .evaluator
            .evaluate_toxicity(&input.text, &input.language_code)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(err) => {
                let error = err.to_string();
                self.advance(ctx, &state, TextEvent::Fail { error }).await?;
                return Err(err.into());
            }
        };
        ctx.record_evaluation(evaluation.into()).await;

        let state = self
            .advance(ctx, &state, TextEvent::ToxicityScored(evaluation))
            .await?;
        let state = self
            .advance(
                ctx,
                &state,
                TextEvent::Decide {
                    started_at: ctx.started_at(),
                },
            )
            .await?;

        if let TextState::PendingHumanReview(_) = state {
            self.review
                .request_review(ctx.execution_id(), &input, evaluation.toxicity_score)
                .await;
        }

        state
            .decision()
            .cloned()
            .ok_or(WorkflowError::NoDecision(state.name()))
    }
}
