//! Execution records.

use chrono::{DateTime, Utc};
use modgate_core::models::{
    EvaluationResult, ModerationDecision, ModerationOutcome, ModerationRequest,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use crate::machine::FAILED_STATE;

/// `{workflowId}:{uuid}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn generate(workflow_id: &str) -> Self {
        Self(format!("{}:{}", workflow_id, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExecutionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for ExecutionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// Terminal output: the success marker, plus the decision unless it approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutput {
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_decision: Option<ModerationDecision>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub execution_id: ExecutionId,
    pub workflow_id: String,
    pub request: ModerationRequest,
    pub status: ExecutionStatus,
    pub current_state: String,
    pub visited_states: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ModerationDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    pub fn new(
        execution_id: ExecutionId,
        workflow_id: impl Into<String>,
        request: ModerationRequest,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            execution_id,
            workflow_id: workflow_id.into(),
            request,
            status: ExecutionStatus::Running,
            current_state: String::new(),
            visited_states: Vec::new(),
            evaluation: None,
            decision: None,
            error: None,
            started_at,
            finished_at: None,
        }
    }

    pub fn enter_state(&mut self, name: &str) {
        self.current_state = name.to_string();
        self.visited_states.push(name.to_string());
    }

    /// End the execution in `Failed` with `status` and no decision.
    pub fn fail(&mut self, status: ExecutionStatus, error: String) {
        if self.current_state != FAILED_STATE {
            self.enter_state(FAILED_STATE);
        }
        self.status = status;
        self.error = Some(error);
        self.decision = None;
        self.finished_at = Some(Utc::now());
    }

    /// Output of a succeeded execution; `None` while running or after a failure.
    pub fn output(&self) -> Option<ExecutionOutput> {
        if self.status != ExecutionStatus::Succeeded {
            return None;
        }
        let moderation_decision = self
            .decision
            .as_ref()
            .filter(|d| d.outcome != ModerationOutcome::Approved)
            .cloned();
        Some(ExecutionOutput {
            status: self.status,
            moderation_decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgate_core::models::REASON_TEXT_TOXIC;

    #[test]
    fn execution_id_is_prefixed_with_workflow() {
        let id = ExecutionId::generate("ModerationPlatform-textModerationWorkflow");
        let (workflow, uuid) = id.as_str().split_once(':').unwrap();
        assert_eq!(workflow, "ModerationPlatform-textModerationWorkflow");
        assert!(Uuid::parse_str(uuid).is_ok());
    }

    #[test]
    fn rejection_output_carries_decision() {
        let started = Utc::now();
        let mut execution = WorkflowExecution::new(
            ExecutionId::generate("text"),
            "text",
            ModerationRequest::text("you are worthless", "en"),
            started,
        );
        assert!(execution.output().is_none());

        execution.status = ExecutionStatus::Succeeded;
        execution.decision = Some(ModerationDecision::new(
            ModerationOutcome::Rejected,
            REASON_TEXT_TOXIC,
            started,
        ));
        let value = serde_json::to_value(execution.output().unwrap()).unwrap();
        assert_eq!(value["status"], "SUCCEEDED");
        assert_eq!(value["moderationDecision"]["decision"], "REJECTED");
        assert_eq!(
            value["moderationDecision"]["reason"],
            "Content contains highly toxic language"
        );
    }

    #[test]
    fn approval_output_is_only_the_success_marker() {
        let started = Utc::now();
        let mut execution = WorkflowExecution::new(
            ExecutionId::generate("image"),
            "image",
            ModerationRequest::image("abc-photo.png"),
            started,
        );
        execution.status = ExecutionStatus::Succeeded;
        execution.decision = Some(ModerationDecision::new(
            ModerationOutcome::Approved,
            "Image passed moderation checks",
            started,
        ));
        let value = serde_json::to_value(execution.output().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"status": "SUCCEEDED"}));
    }
}
