//! Test helpers: build AppState and router for integration tests.

use axum_test::TestServer;
use modgate_api::setup::routes;
use modgate_api::state::AppState;
use modgate_core::Config;
use modgate_storage::test_helpers::MockStorage;
use modgate_storage::Storage;
use modgate_workflow::ExecutionRegistry;
use std::sync::Arc;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", modgate_api::constants::API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub registry: Arc<ExecutionRegistry>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Default configuration without touching the process environment.
pub fn test_config() -> Config {
    Config::from_lookup(|_| None).expect("default config")
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_storage(Arc::new(MockStorage::new()))
}

pub fn setup_test_app_with_storage(storage: Arc<dyn Storage>) -> TestApp {
    let config = test_config();
    let registry = Arc::new(ExecutionRegistry::new(100));
    let state = Arc::new(AppState {
        config: config.clone(),
        storage,
        registry: registry.clone(),
    });
    let router = routes::setup_routes(&config, state).expect("routes");

    TestApp {
        server: TestServer::new(router).expect("test server"),
        registry,
    }
}
