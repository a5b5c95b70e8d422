//! Modgate Infrastructure Library
//!
//! Shared infrastructure used by the modgate binary:
//! - Middleware (request ID, security headers)
//! - Tracing initialization
//! - Error response body
//! - Log-backed alert sink

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod alert;
pub mod error;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};

pub use alert::LogAlertSink;
pub use error::ErrorResponse;
