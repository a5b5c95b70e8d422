//! Modgate API Library
//!
//! HTTP handlers, application state and the setup that wires storage, the
//! workflow engines and the queue consumers together.

pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use modgate_infra::ErrorResponse;
