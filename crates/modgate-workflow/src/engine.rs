//! Workflow engine
//!
//! Each accepted request becomes one execution running in its own tokio task,
//! bounded by a wall-clock timeout. Executions never retry; failures and
//! timeouts end the execution and raise an alert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modgate_core::models::{EvaluationResult, ModerationDecision, ModerationRequest};
use modgate_core::{Alert, AlertSeverity, AlertSink};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::WorkflowError;
use crate::execution::{ExecutionId, ExecutionStatus, WorkflowExecution};
use crate::machine::WorkflowState;
use crate::registry::ExecutionRegistry;

pub const EXECUTION_FAILED_ALERT: &str = "workflow-execution-failed";
pub const EXECUTION_TIMED_OUT_ALERT: &str = "workflow-execution-timed-out";

/// A moderation workflow the engine can execute.
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    type Input: Into<ModerationRequest> + Clone + Send + Sync + 'static;

    /// Identifier used as the execution id prefix
    fn id(&self) -> &str;

    /// Drive one execution to a decision.
    async fn run(
        &self,
        input: Self::Input,
        ctx: &ExecutionContext,
    ) -> Result<ModerationDecision, WorkflowError>;
}

/// Handle a running workflow uses to record its progress.
pub struct ExecutionContext {
    execution_id: ExecutionId,
    started_at: DateTime<Utc>,
    registry: Arc<ExecutionRegistry>,
}

impl ExecutionContext {
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub async fn enter<S: WorkflowState + Sync>(&self, state: &S) {
        let name = state.name();
        tracing::debug!(execution_id = %self.execution_id, state = name, "Entered state");
        self.registry
            .update(&self.execution_id, |e| e.enter_state(name))
            .await;
    }

    pub async fn record_evaluation(&self, evaluation: EvaluationResult) {
        self.registry
            .update(&self.execution_id, |e| e.evaluation = Some(evaluation))
            .await;
    }
}

pub struct WorkflowEngine<W: Workflow> {
    workflow: Arc<W>,
    registry: Arc<ExecutionRegistry>,
    alerts: Arc<dyn AlertSink>,
    timeout: Duration,
    closed: AtomicBool,
}

impl<W: Workflow> WorkflowEngine<W> {
    pub fn new(
        workflow: W,
        registry: Arc<ExecutionRegistry>,
        alerts: Arc<dyn AlertSink>,
        timeout: Duration,
    ) -> Self {
        Self {
            workflow: Arc::new(workflow),
            registry,
            alerts,
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn workflow_id(&self) -> &str {
        self.workflow.id()
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    /// Stop accepting new executions. Running ones continue.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Accept a new execution and return its id without waiting for the decision.
    pub async fn start(&self, input: W::Input) -> Result<ExecutionId, WorkflowError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(WorkflowError::StartFailure {
                workflow: self.workflow.id().to_string(),
                message: "engine is shut down".to_string(),
            });
        }

        let execution_id = ExecutionId::generate(self.workflow.id());
        let started_at = Utc::now();
        let execution = WorkflowExecution::new(
            execution_id.clone(),
            self.workflow.id(),
            input.clone().into(),
            started_at,
        );
        self.registry.insert(execution).await;

        let ctx = ExecutionContext {
            execution_id: execution_id.clone(),
            started_at,
            registry: self.registry.clone(),
        };
        let workflow = self.workflow.clone();
        let alerts = self.alerts.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, workflow.run(input, &ctx)).await;
            Self::complete(ctx, alerts, timeout, result).await;
        });

        tracing::info!(
            execution_id = %execution_id,
            workflow_id = %self.workflow.id(),
            "Workflow execution started"
        );

        Ok(execution_id)
    }

    async fn complete(
        ctx: ExecutionContext,
        alerts: Arc<dyn AlertSink>,
        timeout: Duration,
        result: Result<Result<ModerationDecision, WorkflowError>, tokio::time::error::Elapsed>,
    ) {
        let execution_id = ctx.execution_id;
        let registry = ctx.registry;

        match result {
            Ok(Ok(decision)) => {
                tracing::info!(
                    execution_id = %execution_id,
                    decision = %decision.outcome,
                    reason = %decision.reason,
                    "Workflow execution succeeded"
                );
                registry
                    .finish(&execution_id, |e| {
                        e.status = ExecutionStatus::Succeeded;
                        e.decision = Some(decision);
                        e.finished_at = Some(Utc::now());
                    })
                    .await;
            }
            Ok(Err(err)) => {
                tracing::error!(
                    execution_id = %execution_id,
                    error = %err,
                    "Workflow execution failed"
                );
                let message = err.to_string();
                registry
                    .finish(&execution_id, |e| {
                        e.fail(ExecutionStatus::Failed, message.clone())
                    })
                    .await;
                alerts
                    .raise(Alert::new(
                        EXECUTION_FAILED_ALERT,
                        AlertSeverity::Critical,
                        "Moderation workflow execution failed",
                        json!({ "executionId": execution_id, "error": message }),
                    ))
                    .await;
            }
            Err(_) => {
                let err = WorkflowError::TimedOut(timeout);
                tracing::error!(
                    execution_id = %execution_id,
                    timeout_secs = timeout.as_secs(),
                    "Workflow execution timed out"
                );
                let message = err.to_string();
                registry
                    .finish(&execution_id, |e| {
                        e.fail(ExecutionStatus::TimedOut, message.clone())
                    })
                    .await;
                alerts
                    .raise(Alert::new(
                        EXECUTION_TIMED_OUT_ALERT,
                        AlertSeverity::Critical,
                        "Moderation workflow execution timed out",
                        json!({ "executionId": execution_id, "error": message }),
                    ))
                    .await;
            }
        }
    }
}
