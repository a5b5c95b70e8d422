//! HTTP surface integration tests.

mod helpers;

use chrono::Utc;
use helpers::{api_path, setup_test_app, setup_test_app_with_storage};
use modgate_core::models::{ModerationDecision, ModerationOutcome, ModerationRequest};
use modgate_core::StorageBackend;
use modgate_storage::test_helpers::MockStorage;
use modgate_storage::LocalStorage;
use modgate_workflow::{ExecutionId, ExecutionStatus, WorkflowExecution};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn presigned_upload_returns_url_and_prefixed_key() {
    let app = setup_test_app();

    let res = app
        .client()
        .post(&api_path("/uploads/presigned"))
        .json(&json!({ "fileName": "notes.txt", "contentType": "text/plain" }))
        .await;

    assert_eq!(res.status_code(), 200);
    let body: serde_json::Value = res.json();
    let object_key = body["objectKey"].as_str().unwrap();
    let (uuid, file_name) = object_key.split_at(36);
    assert!(uuid::Uuid::parse_str(uuid).is_ok());
    assert_eq!(file_name, "-notes.txt");
    let url = body["presignedUrl"].as_str().unwrap();
    assert!(url.contains(object_key));
    assert!(url.ends_with("X-Amz-Expires=3600"));
}

#[tokio::test]
async fn presigned_upload_requires_both_fields() {
    let app = setup_test_app();

    for body in [
        json!({ "fileName": "notes.txt" }),
        json!({ "contentType": "text/plain" }),
        json!({ "fileName": "", "contentType": "text/plain" }),
        json!({}),
    ] {
        let res = app
            .client()
            .post(&api_path("/uploads/presigned"))
            .json(&body)
            .await;
        assert_eq!(res.status_code(), 400, "{}", body);
        let error: serde_json::Value = res.json();
        assert_eq!(
            error["error"],
            "Missing required parameters: fileName and contentType"
        );
        assert_eq!(error["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn presigned_upload_rejects_invalid_json() {
    let app = setup_test_app();

    let res = app
        .client()
        .post(&api_path("/uploads/presigned"))
        .content_type("application/json")
        .text("{not json")
        .await;

    assert_eq!(res.status_code(), 400);
    let error: serde_json::Value = res.json();
    assert_eq!(error["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn presigned_upload_needs_s3_backend() {
    let app = setup_test_app_with_storage(Arc::new(MockStorage::with_backend(
        StorageBackend::Local,
    )));

    let res = app
        .client()
        .post(&api_path("/uploads/presigned"))
        .json(&json!({ "fileName": "a.png", "contentType": "image/png" }))
        .await;

    assert_eq!(res.status_code(), 400);
}

#[tokio::test]
async fn unknown_execution_is_404() {
    let app = setup_test_app();

    let res = app
        .client()
        .get(&api_path("/executions/text:does-not-exist"))
        .await;

    assert_eq!(res.status_code(), 404);
    let error: serde_json::Value = res.json();
    assert_eq!(error["code"], "NOT_FOUND");
}

#[tokio::test]
async fn rejected_execution_exposes_decision_output() {
    let app = setup_test_app();
    let id = ExecutionId::generate("text");
    let started_at = Utc::now();
    app.registry
        .insert(WorkflowExecution::new(
            id.clone(),
            "text",
            ModerationRequest::text("you are worthless", "en"),
            started_at,
        ))
        .await;
    app.registry
        .finish(&id, |e| {
            for state in ["Start", "EvaluatingToxicity", "EvaluatingDecision", "Rejected"] {
                e.enter_state(state);
            }
            e.status = ExecutionStatus::Succeeded;
            e.decision = Some(ModerationDecision::new(
                ModerationOutcome::Rejected,
                "Content contains highly toxic language",
                started_at,
            ));
            e.finished_at = Some(Utc::now());
        })
        .await;

    let res = app
        .client()
        .get(&api_path(&format!("/executions/{}", id)))
        .await;

    assert_eq!(res.status_code(), 200);
    let body: serde_json::Value = res.json();
    assert_eq!(body["executionId"], id.as_str());
    assert_eq!(body["status"], "SUCCEEDED");
    assert_eq!(body["currentState"], "Rejected");
    assert_eq!(body["request"]["inputText"], "you are worthless");
    assert_eq!(body["output"]["status"], "SUCCEEDED");
    assert_eq!(body["output"]["moderationDecision"]["decision"], "REJECTED");
    assert_eq!(
        body["output"]["moderationDecision"]["reason"],
        "Content contains highly toxic language"
    );
}

#[tokio::test]
async fn running_execution_has_no_output() {
    let app = setup_test_app();
    let id = ExecutionId::generate("image");
    app.registry
        .insert(WorkflowExecution::new(
            id.clone(),
            "image",
            ModerationRequest::image("abc-photo.png"),
            Utc::now(),
        ))
        .await;

    let res = app
        .client()
        .get(&api_path(&format!("/executions/{}", id)))
        .await;

    let body: serde_json::Value = res.json();
    assert_eq!(body["status"], "RUNNING");
    assert!(body.get("output").is_none());
}

#[tokio::test]
async fn liveness_is_always_ok() {
    let app = setup_test_app();
    let res = app.client().get("/health/live").await;
    assert_eq!(res.status_code(), 200);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn readiness_reflects_storage_health() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();
    let app = setup_test_app_with_storage(Arc::new(storage));
    let res = app.client().get("/health/ready").await;
    assert_eq!(res.status_code(), 200);
    let body: serde_json::Value = res.json();
    assert_eq!(body["storage"], "ready");
}
