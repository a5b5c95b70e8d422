//! Data models for the moderation path
//!
//! Upload notifications, the requests built from them, evaluator results and
//! the decisions workflows emit.

mod decision;
mod evaluation;
pub mod presigned_upload;
mod request;
mod upload_event;

pub use decision::*;
pub use evaluation::*;
pub use presigned_upload::*;
pub use request::*;
pub use upload_event::*;
