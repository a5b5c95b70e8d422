//! Modgate Workflow
//!
//! The text and image moderation workflows as explicit state machines, the
//! engine that runs executions on the tokio runtime, and the router that
//! sends each request to exactly one workflow.

pub mod engine;
pub mod error;
pub mod execution;
pub mod image;
pub mod machine;
pub mod registry;
pub mod review;
pub mod router;
pub mod text;

pub use engine::{ExecutionContext, Workflow, WorkflowEngine};
pub use error::WorkflowError;
pub use execution::{ExecutionId, ExecutionOutput, ExecutionStatus, WorkflowExecution};
pub use image::{ImageEvent, ImageState, ImageStateMachine, ImageWorkflow};
pub use machine::{InvalidTransition, WorkflowState};
pub use registry::ExecutionRegistry;
pub use review::{HumanReviewRequester, LogHumanReviewRequester};
pub use router::{WorkflowLauncher, WorkflowRouter};
pub use text::{TextEvent, TextModerationPolicy, TextState, TextStateMachine, TextWorkflow, Verdict};
