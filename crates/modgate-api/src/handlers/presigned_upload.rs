use crate::constants::MISSING_UPLOAD_PARAMETERS;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use modgate_core::models::presigned_upload::{PresignedUploadRequest, PresignedUploadResponse};
use modgate_core::{AppError, StorageBackend};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Generate a presigned URL for a direct upload into the upload bucket.
///
/// The object key is `{uuid}-{fileName}`; the upload then triggers the
/// moderation pipeline through the bucket's notification.
#[tracing::instrument(skip(state, request), fields(operation = "generate_presigned_url"))]
pub async fn generate_presigned_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, HttpAppError> {
    let (file_name, content_type) = request
        .required_fields()
        .ok_or_else(|| AppError::BadRequest(MISSING_UPLOAD_PARAMETERS.to_string()))?;

    if state.storage.backend_type() != StorageBackend::S3 {
        return Err(AppError::BadRequest(
            "Presigned URLs are only available when using the S3 storage backend".to_string(),
        )
        .into());
    }

    let object_key = format!("{}-{}", Uuid::new_v4(), file_name);
    let expires_in = Duration::from_secs(state.config.storage.presigned_url_expiry_secs);

    let presigned_url = state
        .storage
        .presigned_put_url(&object_key, content_type, expires_in)
        .await?;

    tracing::info!(
        object_key = %object_key,
        content_type = %content_type,
        expires_in_secs = expires_in.as_secs(),
        "Generated presigned URL for direct upload"
    );

    Ok(Json(PresignedUploadResponse {
        presigned_url,
        object_key,
    }))
}
