use serde::{Deserialize, Serialize};

/// Request for a presigned PUT URL into the upload bucket.
///
/// Fields are optional so that a missing one surfaces as a 400 with the
/// documented message instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUploadRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl PresignedUploadRequest {
    /// Both fields, when present and non-empty.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let file_name = self.file_name.as_deref().filter(|s| !s.trim().is_empty())?;
        let content_type = self.content_type.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((file_name, content_type))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUploadResponse {
    pub presigned_url: String,
    /// `{uuid}-{fileName}`
    pub object_key: String,
}
