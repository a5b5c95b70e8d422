use modgate_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Storage, workflow engines, queue consumers and routes
    let app = modgate_api::setup::initialize_app(config.clone()).await?;

    modgate_api::setup::server::start_server(&config, app.router).await?;

    app.runtime.shutdown().await;
    modgate_infra::shutdown_telemetry().await;

    Ok(())
}
