use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use modgate_core::AppError;
use modgate_workflow::{ExecutionId, ExecutionOutput, WorkflowExecution};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    #[serde(flatten)]
    pub execution: WorkflowExecution,
    /// Terminal output; absent while running or after a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ExecutionOutput>,
}

/// Look up a workflow execution by id.
#[tracing::instrument(skip(state))]
pub async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(execution_id): Path<String>,
) -> Result<Json<ExecutionResponse>, HttpAppError> {
    let id = ExecutionId::from(execution_id);
    let execution = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Execution {} not found", id)))?;

    let output = execution.output();
    Ok(Json(ExecutionResponse { execution, output }))
}
