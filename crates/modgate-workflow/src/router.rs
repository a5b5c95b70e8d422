//! Routes each moderation request to exactly one workflow engine.

use async_trait::async_trait;
use modgate_core::models::ModerationRequest;
use modgate_core::{Alert, AlertSeverity, AlertSink};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{WorkflowEngine, EXECUTION_FAILED_ALERT};
use crate::error::WorkflowError;
use crate::execution::ExecutionId;
use crate::image::ImageWorkflow;
use crate::registry::ExecutionRegistry;
use crate::text::TextWorkflow;

/// Hands a request to a workflow engine and returns the accepted execution id.
#[async_trait]
pub trait WorkflowLauncher: Send + Sync {
    async fn start(&self, request: ModerationRequest) -> Result<ExecutionId, WorkflowError>;
}

pub struct WorkflowRouter {
    text: Arc<WorkflowEngine<TextWorkflow>>,
    image: Arc<WorkflowEngine<ImageWorkflow>>,
    registry: Arc<ExecutionRegistry>,
}

impl WorkflowRouter {
    /// Both engines should share `registry` so any execution can be looked up.
    pub fn new(
        text: Arc<WorkflowEngine<TextWorkflow>>,
        image: Arc<WorkflowEngine<ImageWorkflow>>,
        registry: Arc<ExecutionRegistry>,
    ) -> Self {
        Self {
            text,
            image,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    /// Stop both engines from accepting new executions.
    pub fn close(&self) {
        self.text.close();
        self.image.close();
    }

    /// Close both engines and wait up to `grace` for running executions to end.
    ///
    /// Executions still running after `grace` are failed and alerted on, so
    /// none is dropped with the runtime. Returns how many were failed.
    pub async fn shutdown(&self, grace: Duration, alerts: &dyn AlertSink) -> usize {
        self.close();
        if tokio::time::timeout(grace, self.registry.wait_idle())
            .await
            .is_ok()
        {
            return 0;
        }

        let error = format!(
            "Runtime shut down before the execution finished (waited {}s)",
            grace.as_secs()
        );
        let abandoned = self.registry.fail_running(&error).await;
        for execution_id in &abandoned {
            tracing::error!(
                execution_id = %execution_id,
                "Workflow execution abandoned at shutdown"
            );
            alerts
                .raise(Alert::new(
                    EXECUTION_FAILED_ALERT,
                    AlertSeverity::Critical,
                    "Moderation workflow execution failed",
                    json!({ "executionId": execution_id, "error": error }),
                ))
                .await;
        }
        abandoned.len()
    }
}

#[async_trait]
impl WorkflowLauncher for WorkflowRouter {
    async fn start(&self, request: ModerationRequest) -> Result<ExecutionId, WorkflowError> {
        match request {
            ModerationRequest::Text(text) => self.text.start(text).await,
            ModerationRequest::Image(image) => self.image.start(image).await,
        }
    }
}
