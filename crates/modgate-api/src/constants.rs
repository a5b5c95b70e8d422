//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

pub const API_VERSION: &str = "v0";

/// Versioned prefix all JSON routes live under
pub const API_PREFIX: &str = "/api/v0";

/// Message returned when a presigned-upload request lacks a field
pub const MISSING_UPLOAD_PARAMETERS: &str =
    "Missing required parameters: fileName and contentType";

/// Request bodies are small JSON documents
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
