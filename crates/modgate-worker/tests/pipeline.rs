use modgate_core::models::{ModerationOutcome, REASON_TEXT_TOXIC};
use modgate_core::test_helpers::RecordingAlertSink;
use modgate_core::ContentClassifier;
use modgate_evaluators::test_helpers::{MockLabelDetector, MockTextDetector, MockToxicityEvaluator};
use modgate_evaluators::ImageContentEvaluator;
use modgate_storage::test_helpers::MockStorage;
use modgate_worker::{
    DeliveryFailure, DeliveryOutcome, DeliveryProcessor, Dispatcher, InMemoryQueue,
    QueueConsumer, RetryPolicy, UPLOAD_DLQ_ALERT,
};
use modgate_workflow::{
    ExecutionId, ExecutionRegistry, ExecutionStatus, ImageWorkflow, LogHumanReviewRequester,
    TextModerationPolicy, TextStateMachine, TextWorkflow, WorkflowEngine, WorkflowExecution,
    WorkflowRouter,
};
use std::sync::Arc;
use std::time::Duration;

struct Pipeline {
    queue: Arc<InMemoryQueue>,
    processor: DeliveryProcessor,
    registry: Arc<ExecutionRegistry>,
    storage: MockStorage,
    alerts: RecordingAlertSink,
}

fn pipeline(toxicity_score: f32) -> Pipeline {
    let registry = Arc::new(ExecutionRegistry::new(100));
    let alerts = RecordingAlertSink::new();
    let storage = MockStorage::new();

    let text_engine = WorkflowEngine::new(
        TextWorkflow::new(
            "text-workflow",
            TextStateMachine::new(TextModerationPolicy::default()),
            Arc::new(MockToxicityEvaluator::scoring(toxicity_score)),
            Arc::new(LogHumanReviewRequester),
        ),
        registry.clone(),
        Arc::new(alerts.clone()),
        Duration::from_secs(300),
    );
    let image_engine = WorkflowEngine::new(
        ImageWorkflow::new(
            "image-workflow",
            ImageContentEvaluator::new(
                Arc::new(MockLabelDetector::empty()),
                Arc::new(MockTextDetector::empty()),
            ),
        ),
        registry.clone(),
        Arc::new(alerts.clone()),
        Duration::from_secs(300),
    );
    let router = WorkflowRouter::new(
        Arc::new(text_engine),
        Arc::new(image_engine),
        registry.clone(),
    );

    let dispatcher = Dispatcher::new(
        Arc::new(storage.clone()),
        Arc::new(router),
        ContentClassifier::default(),
        "en",
    );
    let queue = Arc::new(InMemoryQueue::new(
        Duration::from_secs(30),
        Duration::from_millis(50),
    ));
    let processor = DeliveryProcessor::new(
        queue.clone(),
        Arc::new(dispatcher),
        Arc::new(alerts.clone()),
        RetryPolicy::default(),
    );

    Pipeline {
        queue,
        processor,
        registry,
        storage,
        alerts,
    }
}

fn notification(event_name: &str, key: &str) -> String {
    serde_json::json!({
        "Records": [{
            "eventSource": "aws:s3",
            "eventName": event_name,
            "s3": { "bucket": { "name": "uploads" }, "object": { "key": key, "size": 5 } }
        }]
    })
    .to_string()
}

async fn finished(registry: &ExecutionRegistry, id: &ExecutionId) -> WorkflowExecution {
    tokio::time::timeout(Duration::from_secs(5), registry.wait_finished(id))
        .await
        .expect("execution did not finish")
        .expect("execution missing from registry")
}

fn started_execution(outcome: DeliveryOutcome) -> ExecutionId {
    match outcome {
        DeliveryOutcome::Acked(report) => {
            assert_eq!(report.started.len(), 1);
            report.started[0].execution_id.clone()
        }
        other => panic!("expected ack, got {:?}", other),
    }
}

#[tokio::test]
async fn toxic_text_upload_is_rejected() {
    let p = pipeline(0.95);
    p.storage.set_file("abc-notes.txt", "you are terrible");
    p.queue
        .send(notification("ObjectCreated:Put", "abc-notes.txt"))
        .await;

    let outcome = p.processor.poll_once().await.unwrap().unwrap();
    let id = started_execution(outcome);
    assert!(p.queue.is_empty().await);

    let execution = finished(&p.registry, &id).await;
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
    let decision = execution.decision.unwrap();
    assert_eq!(decision.outcome, ModerationOutcome::Rejected);
    assert_eq!(decision.reason, REASON_TEXT_TOXIC);
}

#[tokio::test]
async fn clean_image_upload_is_approved() {
    let p = pipeline(0.0);
    p.queue
        .send(notification("ObjectCreated:Put", "abc-photo.png"))
        .await;

    let id = started_execution(p.processor.poll_once().await.unwrap().unwrap());

    let execution = finished(&p.registry, &id).await;
    assert_eq!(execution.current_state, "Approved");
    assert_eq!(
        execution.decision.unwrap().outcome,
        ModerationOutcome::Approved
    );
}

#[tokio::test]
async fn unsupported_upload_is_redelivered_once_then_dead_lettered() {
    let p = pipeline(0.0);
    p.queue
        .send(notification("ObjectCreated:Put", "abc-doc.pdf"))
        .await;

    let first = p.processor.poll_once().await.unwrap().unwrap();
    assert!(matches!(first, DeliveryOutcome::Released(_)));
    assert!(p.alerts.alerts().is_empty());

    let second = p.processor.poll_once().await.unwrap().unwrap();
    assert!(matches!(
        second,
        DeliveryOutcome::DeadLettered(DeliveryFailure::Dispatch(_))
    ));

    assert!(p.queue.is_empty().await);
    let dead = p.queue.dead_letters().await;
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].receive_count, 2);
    assert!(dead[0].reason.starts_with("UNSUPPORTED_CONTENT_TYPE"));
    assert!(dead[0].body.contains("abc-doc.pdf"));

    assert_eq!(p.alerts.names(), vec![UPLOAD_DLQ_ALERT]);
    assert!(p.registry.is_empty().await);
}

#[tokio::test]
async fn removal_event_is_acked_without_execution() {
    let p = pipeline(0.0);
    p.queue
        .send(notification("ObjectRemoved:Delete", "abc-notes.txt"))
        .await;

    match p.processor.poll_once().await.unwrap().unwrap() {
        DeliveryOutcome::Acked(report) => {
            assert!(report.started.is_empty());
            assert_eq!(report.skipped.len(), 1);
        }
        other => panic!("expected ack, got {:?}", other),
    }
    assert!(p.queue.is_empty().await);
    assert!(p.registry.is_empty().await);
}

#[tokio::test]
async fn missing_object_key_is_dead_lettered_as_malformed() {
    let p = pipeline(0.0);
    let body = serde_json::json!({
        "Records": [{
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": { "bucket": { "name": "uploads" }, "object": { "size": 5 } }
        }]
    })
    .to_string();
    p.queue.send(body).await;

    p.processor.poll_once().await.unwrap();
    p.processor.poll_once().await.unwrap();

    let dead = p.queue.dead_letters().await;
    assert_eq!(dead.len(), 1);
    assert!(dead[0].reason.starts_with("MALFORMED_EVENT"));
}

#[tokio::test]
async fn test_event_without_records_is_acked() {
    let p = pipeline(0.0);
    p.queue
        .send(r#"{"Service":"Amazon S3","Event":"s3:TestEvent","Bucket":"uploads"}"#)
        .await;

    let outcome = p.processor.poll_once().await.unwrap().unwrap();
    assert!(matches!(outcome, DeliveryOutcome::Acked(ref r) if r.started.is_empty()));
    assert!(p.queue.is_empty().await);
}

#[tokio::test]
async fn consumer_pool_drains_queue_and_shuts_down() {
    let p = pipeline(0.1);
    p.storage.set_file("a.txt", "hello");
    p.queue.send(notification("ObjectCreated:Put", "a.txt")).await;
    p.queue
        .send(notification("ObjectCreated:Put", "b.jpeg"))
        .await;

    let consumer = QueueConsumer::start(p.processor.clone(), 2);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !p.queue.is_empty().await || p.registry.len().await < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue was not drained");

    consumer.shutdown().await;
    assert!(p.queue.dead_letters().await.is_empty());
}
