//! Upload notification dispatcher.
//!
//! Turns one queue message (a storage notification) into workflow executions:
//! filter object-created records, classify each object, build the request
//! (fetching text payloads from storage) and hand it to the launcher.

use modgate_core::models::{ModerationRequest, S3EventNotification, UploadEvent};
use modgate_core::{ContentClassifier, ContentKind, ModerationError};
use modgate_storage::Storage;
use modgate_workflow::{ExecutionId, WorkflowLauncher};
use std::sync::Arc;

/// An execution started for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedExecution {
    pub object_key: String,
    pub kind: ContentKind,
    pub execution_id: ExecutionId,
}

/// A record that was ignored because it is not an object-created event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    pub event_name: String,
    pub object_key: Option<String>,
}

/// Outcome of dispatching one notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub started: Vec<StartedExecution>,
    pub skipped: Vec<SkippedEvent>,
}

pub struct Dispatcher {
    storage: Arc<dyn Storage>,
    launcher: Arc<dyn WorkflowLauncher>,
    classifier: ContentClassifier,
    default_language_code: String,
}

impl Dispatcher {
    pub fn new(
        storage: Arc<dyn Storage>,
        launcher: Arc<dyn WorkflowLauncher>,
        classifier: ContentClassifier,
        default_language_code: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            launcher,
            classifier,
            default_language_code: default_language_code.into(),
        }
    }

    /// Dispatch every object-created record of a notification body.
    ///
    /// All records are resolved into requests before any execution starts, so a
    /// malformed or unsupported record fails the message without side effects.
    /// A start failure part way through leaves the earlier executions running;
    /// the redelivered message starts them again.
    #[tracing::instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn dispatch(&self, body: &str) -> Result<DispatchReport, ModerationError> {
        let notification = S3EventNotification::parse(body)?;
        let mut report = DispatchReport::default();

        let mut pending = Vec::new();
        for record in &notification.records {
            if !record.is_object_created() {
                tracing::debug!(
                    event_name = record.event_name(),
                    event_source = record.event_source.as_deref().unwrap_or_default(),
                    "Skipping non object-created record"
                );
                report.skipped.push(SkippedEvent {
                    event_name: record.event_name().to_string(),
                    object_key: record.raw_object_key().map(str::to_string),
                });
                continue;
            }

            let event = record.to_upload_event()?;
            let (kind, request) = self.build_request(&event).await?;
            pending.push((event.object_key, kind, request));
        }

        for (object_key, kind, request) in pending {
            let execution_id = self.launcher.start(request).await.map_err(|e| {
                ModerationError::WorkflowStart {
                    workflow: kind.to_string(),
                    message: e.to_string(),
                }
            })?;

            tracing::info!(
                object_key = %object_key,
                content_kind = %kind,
                execution_id = %execution_id,
                "Started moderation workflow"
            );

            report.started.push(StartedExecution {
                object_key,
                kind,
                execution_id,
            });
        }

        Ok(report)
    }

    async fn build_request(
        &self,
        event: &UploadEvent,
    ) -> Result<(ContentKind, ModerationRequest), ModerationError> {
        let kind = self.classifier.classify(&event.object_key);
        match kind {
            ContentKind::Text => {
                let text = self.fetch_text(&event.object_key).await?;
                Ok((
                    kind,
                    ModerationRequest::text(text, self.default_language_code.as_str()),
                ))
            }
            ContentKind::Image => Ok((kind, ModerationRequest::image(event.object_key.as_str()))),
            ContentKind::Unsupported => {
                tracing::warn!(
                    object_key = %event.object_key,
                    bucket = ?event.bucket_name,
                    "Unsupported content type"
                );
                Err(ModerationError::UnsupportedContentType {
                    object_key: event.object_key.clone(),
                })
            }
        }
    }

    async fn fetch_text(&self, object_key: &str) -> Result<String, ModerationError> {
        let bytes = self
            .storage
            .download(object_key)
            .await
            .map_err(|e| ModerationError::PayloadFetch {
                object_key: object_key.to_string(),
                message: e.to_string(),
            })?;

        String::from_utf8(bytes).map_err(|_| ModerationError::PayloadDecode {
            object_key: object_key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use modgate_core::ErrorMetadata;
    use modgate_storage::test_helpers::MockStorage;
    use modgate_workflow::WorkflowError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLauncher {
        requests: Mutex<Vec<ModerationRequest>>,
        fail: bool,
    }

    impl RecordingLauncher {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<ModerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkflowLauncher for RecordingLauncher {
        async fn start(&self, request: ModerationRequest) -> Result<ExecutionId, WorkflowError> {
            if self.fail {
                return Err(WorkflowError::StartFailure {
                    workflow: request.content_kind().to_string(),
                    message: "engine closed".to_string(),
                });
            }
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            Ok(ExecutionId::from(format!("wf:{}", requests.len())))
        }
    }

    fn notification(records: &[(&str, Option<&str>)]) -> String {
        let records: Vec<serde_json::Value> = records
            .iter()
            .map(|(event_name, key)| {
                let mut object = serde_json::json!({ "size": 10 });
                if let Some(key) = key {
                    object["key"] = serde_json::json!(key);
                }
                serde_json::json!({
                    "eventSource": "aws:s3",
                    "eventName": event_name,
                    "s3": { "bucket": { "name": "uploads" }, "object": object }
                })
            })
            .collect();
        serde_json::json!({ "Records": records }).to_string()
    }

    fn dispatcher(storage: MockStorage, launcher: Arc<RecordingLauncher>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(storage),
            launcher,
            ContentClassifier::default(),
            "en",
        )
    }

    #[tokio::test]
    async fn text_upload_starts_text_workflow_with_payload() {
        let storage = MockStorage::new();
        storage.set_file("abc-notes.txt", "hello world");
        let launcher = Arc::new(RecordingLauncher::default());

        let report = dispatcher(storage, launcher.clone())
            .dispatch(&notification(&[("ObjectCreated:Put", Some("abc-notes.txt"))]))
            .await
            .unwrap();

        assert_eq!(report.started.len(), 1);
        assert_eq!(report.started[0].kind, ContentKind::Text);
        assert_eq!(
            launcher.requests(),
            vec![ModerationRequest::text("hello world", "en")]
        );
    }

    #[tokio::test]
    async fn image_upload_passes_decoded_key() {
        let launcher = Arc::new(RecordingLauncher::default());

        let report = dispatcher(MockStorage::new(), launcher.clone())
            .dispatch(&notification(&[(
                "ObjectCreated:CompleteMultipartUpload",
                Some("abc-my+photo%281%29.PNG"),
            )]))
            .await
            .unwrap();

        assert_eq!(report.started[0].object_key, "abc-my photo(1).PNG");
        assert_eq!(
            launcher.requests(),
            vec![ModerationRequest::image("abc-my photo(1).PNG")]
        );
    }

    #[tokio::test]
    async fn records_without_bucket_name_still_start() {
        let storage = MockStorage::new();
        storage.set_file("abc-notes.txt", "hello");
        let launcher = Arc::new(RecordingLauncher::default());
        let body = serde_json::json!({
            "Records": [
                {
                    "eventSource": "aws:s3",
                    "eventName": "ObjectCreated:Put",
                    "s3": { "object": { "key": "abc-photo.png" } }
                },
                {
                    "eventSource": "aws:s3",
                    "eventName": "ObjectCreated:Put",
                    "s3": { "bucket": {}, "object": { "key": "abc-notes.txt" } }
                }
            ]
        })
        .to_string();

        let report = dispatcher(storage, launcher.clone())
            .dispatch(&body)
            .await
            .unwrap();

        assert_eq!(report.started.len(), 2);
        assert_eq!(
            launcher.requests(),
            vec![
                ModerationRequest::image("abc-photo.png"),
                ModerationRequest::text("hello", "en"),
            ]
        );
    }

    #[tokio::test]
    async fn non_created_records_are_skipped() {
        let launcher = Arc::new(RecordingLauncher::default());

        let report = dispatcher(MockStorage::new(), launcher.clone())
            .dispatch(&notification(&[
                ("ObjectRemoved:Delete", Some("a.txt")),
                ("ObjectCreated:Put", Some("b.png")),
            ]))
            .await
            .unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].event_name, "ObjectRemoved:Delete");
        assert_eq!(report.started.len(), 1);
        assert_eq!(launcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_notification_is_a_no_op() {
        let launcher = Arc::new(RecordingLauncher::default());

        let report = dispatcher(MockStorage::new(), launcher.clone())
            .dispatch(r#"{"Service":"Amazon S3","Event":"s3:TestEvent"}"#)
            .await
            .unwrap();

        assert_eq!(report, DispatchReport::default());
        assert!(launcher.requests().is_empty());
    }

    #[tokio::test]
    async fn unsupported_object_fails_without_starting_anything() {
        let launcher = Arc::new(RecordingLauncher::default());

        let err = dispatcher(MockStorage::new(), launcher.clone())
            .dispatch(&notification(&[
                ("ObjectCreated:Put", Some("b.png")),
                ("ObjectCreated:Put", Some("abc-doc.pdf")),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ModerationError::UnsupportedContentType { ref object_key } if object_key == "abc-doc.pdf"
        ));
        assert!(launcher.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_malformed() {
        let launcher = Arc::new(RecordingLauncher::default());

        let err = dispatcher(MockStorage::new(), launcher)
            .dispatch(&notification(&[("ObjectCreated:Put", None)]))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "MALFORMED_EVENT");
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let launcher = Arc::new(RecordingLauncher::default());

        let err = dispatcher(MockStorage::new(), launcher)
            .dispatch("not json")
            .await
            .unwrap_err();

        assert!(matches!(err, ModerationError::MalformedEvent(_)));
    }

    #[tokio::test]
    async fn missing_text_payload_is_fetch_failure() {
        let launcher = Arc::new(RecordingLauncher::default());

        let err = dispatcher(MockStorage::new(), launcher)
            .dispatch(&notification(&[("ObjectCreated:Put", Some("gone.txt"))]))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "PAYLOAD_FETCH_FAILED");
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn non_utf8_text_is_decode_failure() {
        let storage = MockStorage::new();
        storage.set_file("bin.md", vec![0xff, 0xfe, 0x00]);
        let launcher = Arc::new(RecordingLauncher::default());

        let err = dispatcher(storage, launcher)
            .dispatch(&notification(&[("ObjectCreated:Put", Some("bin.md"))]))
            .await
            .unwrap_err();

        assert!(matches!(err, ModerationError::PayloadDecode { .. }));
    }

    #[tokio::test]
    async fn launcher_failure_is_workflow_start_error() {
        let launcher = Arc::new(RecordingLauncher::failing());

        let err = dispatcher(MockStorage::new(), launcher)
            .dispatch(&notification(&[("ObjectCreated:Put", Some("b.webp"))]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ModerationError::WorkflowStart { ref workflow, .. } if workflow == "image"
        ));
    }
}
