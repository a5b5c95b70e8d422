//! Image moderation workflow
//!
//! `Start -> ParallelEvaluation -> EvaluatingDecision -> Approved | Rejected`.
//! Both detectors run inside `ParallelEvaluation`; the state only advances
//! once both returned, and either failing moves the execution to `Failed`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modgate_core::models::{
    ImageEvaluation, ImageRequest, ModerationDecision, ModerationOutcome, REASON_IMAGE_APPROVED,
    REASON_IMAGE_REJECTED,
};
use modgate_evaluators::ImageContentEvaluator;

use crate::engine::{ExecutionContext, Workflow};
use crate::error::WorkflowError;
use crate::machine::{InvalidTransition, WorkflowState, FAILED_STATE};

#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    Start,
    ParallelEvaluation,
    EvaluatingDecision { findings: ImageEvaluation },
    Approved(ModerationDecision),
    Rejected(ModerationDecision),
    Failed { error: String },
}

impl ImageState {
    pub fn decision(&self) -> Option<&ModerationDecision> {
        match self {
            ImageState::Approved(d) | ImageState::Rejected(d) => Some(d),
            _ => None,
        }
    }
}

impl WorkflowState for ImageState {
    fn name(&self) -> &'static str {
        match self {
            ImageState::Start => "Start",
            ImageState::ParallelEvaluation => "ParallelEvaluation",
            ImageState::EvaluatingDecision { .. } => "EvaluatingDecision",
            ImageState::Approved(_) => "Approved",
            ImageState::Rejected(_) => "Rejected",
            ImageState::Failed { .. } => FAILED_STATE,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImageState::Approved(_) | ImageState::Rejected(_) | ImageState::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageEvent {
    Begin,
    /// Both detector branches joined.
    Evaluated(ImageEvaluation),
    Decide { started_at: DateTime<Utc> },
    Fail { error: String },
}

impl ImageEvent {
    fn name(&self) -> &'static str {
        match self {
            ImageEvent::Begin => "Begin",
            ImageEvent::Evaluated(_) => "Evaluated",
            ImageEvent::Decide { .. } => "Decide",
            ImageEvent::Fail { .. } => "Fail",
        }
    }
}

/// Pure transition function of the image workflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageStateMachine;

impl ImageStateMachine {
    pub fn transition(
        &self,
        state: &ImageState,
        event: ImageEvent,
    ) -> Result<ImageState, InvalidTransition> {
        let next = match (state, event) {
            (ImageState::Start, ImageEvent::Begin) => ImageState::ParallelEvaluation,
            (ImageState::ParallelEvaluation, ImageEvent::Evaluated(findings)) => {
                ImageState::EvaluatingDecision { findings }
            }
            (ImageState::EvaluatingDecision { findings }, ImageEvent::Decide { started_at }) => {
                if findings.has_findings() {
                    ImageState::Rejected(ModerationDecision::new(
                        ModerationOutcome::Rejected,
                        REASON_IMAGE_REJECTED,
                        started_at,
                    ))
                } else {
                    ImageState::Approved(ModerationDecision::new(
                        ModerationOutcome::Approved,
                        REASON_IMAGE_APPROVED,
                        started_at,
                    ))
                }
            }
            (current, ImageEvent::Fail { error }) if !current.is_terminal() => {
                ImageState::Failed { error }
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

/// Image workflow bound to the combined image evaluator.
pub struct ImageWorkflow {
    id: String,
    machine: ImageStateMachine,
    evaluator: ImageContentEvaluator,
}

impl ImageWorkflow {
    pub fn new(id: impl Into<String>, evaluator: ImageContentEvaluator) -> Self {
        Self {
            id: id.into(),
            machine: ImageStateMachine,
            evaluator,
        }
    }

    async fn advance(
        &self,
        ctx: &ExecutionContext,
        state: &ImageState,
        event: ImageEvent,
    ) -> Result<ImageState, WorkflowError> {
        let next = self.machine.transition(state, event)?;
        ctx.enter(&next).await;
        Ok(next)
    }
}

#[async_trait]
impl Workflow for ImageWorkflow {
    type Input = ImageRequest;

    fn id(&self) -> &str {
        &self.id
    }

    async fn run(
        &self,
        input: ImageRequest,
        ctx: &ExecutionContext,
    ) -> Result<ModerationDecision, WorkflowError> {
        let state = ImageState::Start;
        ctx.enter(&state).await;

        let state = self.advance(ctx, &state, ImageEvent::Begin).await?;

        let findings = match self.evaluator.evaluate(&input.object_key).await {
            Ok(findings) => findings,
            Err(err) => {
                let error = err.to_string();
                self.advance(ctx, &state, ImageEvent::Fail { error }).await?;
                return Err(err.into());
            }
        };
        ctx.record_evaluation(findings.into()).await;

        let state = self
            .advance(ctx, &state, ImageEvent::Evaluated(findings))
            .await?;
        let state = self
            .advance(
                ctx,
                &state,
                ImageEvent::Decide {
                    started_at: ctx.started_at(),
                },
            )
            .await?;

        state
            .decision()
            .cloned()
            .ok_or(WorkflowError::NoDecision(state.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(labels: bool, text: bool) -> ImageState {
        let machine = ImageStateMachine;
        let state = machine.transition(&ImageState::Start, ImageEvent::Begin).unwrap();
        let state = machine
            .transition(
                &state,
                ImageEvent::Evaluated(ImageEvaluation {
                    moderation_labels_found: labels,
                    text_detected: text,
                }),
            )
            .unwrap();
        machine
            .transition(
                &state,
                ImageEvent::Decide {
                    started_at: Utc::now(),
                },
            )
            .unwrap()
    }

    #[test]
    fn rejected_iff_any_finding() {
        for (labels, text, expected) in [
            (false, false, "Approved"),
            (true, false, "Rejected"),
            (false, true, "Rejected"),
            (true, true, "Rejected"),
        ] {
            assert_eq!(decide(labels, text).name(), expected, "{labels} {text}");
        }
    }

    #[test]
    fn reasons_match_outcome() {
        assert_eq!(
            decide(true, false).decision().unwrap().reason,
            "Image contains inappropriate content"
        );
        assert_eq!(
            decide(false, false).decision().unwrap().reason,
            "Image passed moderation checks"
        );
    }

    #[test]
    fn cannot_decide_before_both_branches_join() {
        let machine = ImageStateMachine;
        let err = machine
            .transition(
                &ImageState::ParallelEvaluation,
                ImageEvent::Decide {
                    started_at: Utc::now(),
                },
            )
            .unwrap_err();
        assert_eq!(err.from, "ParallelEvaluation");
        assert_eq!(err.event, "Decide");
    }

    #[test]
    fn evaluation_failure_is_terminal_without_decision() {
        let machine = ImageStateMachine;
        let failed = machine
            .transition(
                &ImageState::ParallelEvaluation,
                ImageEvent::Fail {
                    error: "AccessDenied".to_string(),
                },
            )
            .unwrap();
        assert!(failed.is_terminal());
        assert!(failed.decision().is_none());
        assert!(machine.transition(&failed, ImageEvent::Begin).is_err());
    }
}
