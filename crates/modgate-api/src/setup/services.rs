//! Workflow engines, dispatcher and queue consumers.

use anyhow::{Context, Result};
use modgate_core::{AlertSink, Config};
use modgate_evaluators::{
    load_aws_config, ComprehendToxicityEvaluator, ImageContentEvaluator, RekognitionImageDetector,
};
use modgate_infra::LogAlertSink;
use modgate_storage::Storage;
use modgate_worker::{create_queue, DeliveryProcessor, Dispatcher, QueueConsumer, RetryPolicy};
use modgate_workflow::{
    ExecutionRegistry, ImageWorkflow, LogHumanReviewRequester, TextModerationPolicy,
    TextStateMachine, TextWorkflow, WorkflowEngine, WorkflowRouter,
};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// Background moderation machinery owned by the process.
pub struct ModerationRuntime {
    consumer: QueueConsumer,
    router: Arc<WorkflowRouter>,
    alerts: Arc<dyn AlertSink>,
    grace: Duration,
}

impl ModerationRuntime {
    /// Stop receiving notifications, refuse new executions, then drain the
    /// running ones for at most one workflow timeout.
    pub async fn shutdown(self) {
        self.consumer.shutdown().await;
        let abandoned = self.router.shutdown(self.grace, self.alerts.as_ref()).await;
        tracing::info!(abandoned_executions = abandoned, "Moderation runtime stopped");
    }
}

pub async fn initialize_services(
    config: &Config,
    storage: Arc<dyn Storage>,
) -> Result<(Arc<AppState>, ModerationRuntime)> {
    let alerts: Arc<dyn AlertSink> = Arc::new(LogAlertSink::new());
    let registry = Arc::new(ExecutionRegistry::new(config.workflow.execution_retention));

    let router = Arc::new(build_workflow_router(config, registry.clone(), alerts.clone()).await?);

    let queue = create_queue(&config.queue, config.storage.region.clone())
        .await
        .context("Failed to initialize notification queue")?;

    let dispatcher = Dispatcher::new(
        storage.clone(),
        router.clone(),
        config.moderation.classifier()?,
        config.moderation.default_language_code.as_str(),
    );
    let processor = DeliveryProcessor::new(
        queue,
        Arc::new(dispatcher),
        alerts.clone(),
        RetryPolicy::new(config.queue.max_redeliveries),
    );
    let consumer = QueueConsumer::start(processor, config.queue.consumers);

    tracing::info!(
        queue_backend = ?config.queue.backend,
        consumers = config.queue.consumers,
        max_redeliveries = config.queue.max_redeliveries,
        "Dispatcher started"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        storage,
        registry,
    });

    let runtime = ModerationRuntime {
        consumer,
        router,
        alerts,
        grace: config.workflow.timeout(),
    };
    Ok((state, runtime))
}

async fn build_workflow_router(
    config: &Config,
    registry: Arc<ExecutionRegistry>,
    alerts: Arc<dyn AlertSink>,
) -> Result<WorkflowRouter> {
    let bucket = config
        .storage
        .bucket
        .clone()
        .context("UPLOAD_BUCKET is missing after config validation")?;
    let sdk_config = load_aws_config(config.storage.region.clone()).await;

    let text_workflow = TextWorkflow::new(
        config.workflow.text_workflow_id.as_str(),
        TextStateMachine::new(TextModerationPolicy::from_config(&config.moderation)),
        Arc::new(ComprehendToxicityEvaluator::from_config(&sdk_config)),
        Arc::new(LogHumanReviewRequester),
    );

    let detector = Arc::new(RekognitionImageDetector::from_config(
        &sdk_config,
        bucket,
        config.moderation.image_min_confidence,
    ));
    let image_workflow = ImageWorkflow::new(
        config.workflow.image_workflow_id.as_str(),
        ImageContentEvaluator::new(detector.clone(), detector),
    );

    let text_engine = WorkflowEngine::new(
        text_workflow,
        registry.clone(),
        alerts.clone(),
        config.workflow.timeout(),
    );
    let image_engine =
        WorkflowEngine::new(image_workflow, registry.clone(), alerts, config.workflow.timeout());

    tracing::info!(
        text_workflow = %config.workflow.text_workflow_id,
        image_workflow = %config.workflow.image_workflow_id,
        timeout_secs = config.workflow.timeout_secs,
        human_review_enabled = config.moderation.human_review_enabled,
        "Workflow engines ready"
    );

    Ok(WorkflowRouter::new(
        Arc::new(text_engine),
        Arc::new(image_engine),
        registry,
    ))
}
