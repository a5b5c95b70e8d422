//! Application state shared by the HTTP handlers.

use modgate_core::Config;
use modgate_storage::Storage;
use modgate_workflow::ExecutionRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Upload bucket, used for presigned URLs and readiness
    pub storage: Arc<dyn Storage>,
    /// Executions of both workflows
    pub registry: Arc<ExecutionRegistry>,
}
