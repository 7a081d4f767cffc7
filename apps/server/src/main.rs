use anyhow::Context;
use parlor_config::load as load_config;
use parlor_gateway::{create_router, GatewayState};
use parlor_pipeline::PersistenceConsumer;
use parlor_runtime::{telemetry, BackendServices, FanOutDispatcher};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Parlor backend");

    // Invalid transport configuration is fatal: there is no runtime recovery
    // from missing broker or bus credentials.
    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(services.bus.clone());

    // One fan-out subscriber per process: deliver to local sessions, then
    // feed the durable log, one frame at a time.
    let dispatcher = FanOutDispatcher::new(state.registry.clone(), services.producer.clone());
    let subscriber_task = tokio::spawn(parlor_bus::run_subscriber(
        services.redis_client.clone(),
        config.redis.channel.clone(),
        dispatcher,
        services.shutdown_receiver(),
    ));

    let consumer = PersistenceConsumer::new(
        &config.kafka,
        services.store.clone(),
        services.shutdown_receiver(),
    )
    .context("failed to create persistence consumer")?;
    let consumer_task = tokio::spawn(async move {
        if let Err(error) = consumer.run().await {
            error!(%error, "persistence consumer failed");
        }
    });

    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(parlor_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    // Stop the background tasks first (this cancels a pending consumer
    // resume timer), then drain connections.
    services.signal_shutdown();
    let _ = subscriber_task.await;
    let _ = consumer_task.await;
    services.shutdown().await;

    info!("backend shut down");
    Ok(())
}
