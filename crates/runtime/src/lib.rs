//! Process context and lifecycle for the Parlor backend.
//!
//! Every long-lived connection — the database pool, the Redis bus
//! connection, the durable log producer — is created exactly once in
//! [`BackendServices::initialise`] and handed by reference to the components
//! that need it. There are no lazy singletons, and [`BackendServices::shutdown`]
//! defines the explicit drain: signal the background tasks (cancelling a
//! pending consumer resume), flush the producer, close the pool.

pub mod dispatch;

pub use dispatch::FanOutDispatcher;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parlor_bus::FanOutBus;
use parlor_config::AppConfig;
use parlor_database::{initialize_database, MessageStore};
use parlor_pipeline::LogProducer;
use redis::aio::ConnectionManager;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

const PRODUCER_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// All process-wide resources, constructed once at startup.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub store: MessageStore,
    pub redis_client: redis::Client,
    pub bus: FanOutBus,
    pub producer: Arc<LogProducer>,
    shutdown: watch::Sender<bool>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database).await?;
        let store = MessageStore::new(db_pool.clone());

        let redis_client = redis::Client::open(config.redis.url.as_str())
            .context("failed to create redis client")?;
        let redis_conn = ConnectionManager::new(redis_client.clone())
            .await
            .context("failed to connect to redis fan-out bus")?;
        info!(url = %config.redis.url, "fan-out bus connection established");

        let bus = FanOutBus::new(redis_conn, config.redis.channel.clone());

        let producer = Arc::new(
            LogProducer::new(&config.kafka).context("failed to create durable log producer")?,
        );

        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            db_pool,
            store,
            redis_client,
            bus,
            producer,
            shutdown,
        })
    }

    /// Receiver for the process-wide shutdown signal. Background tasks
    /// select on this to stop cleanly, including a consumer paused on its
    /// resume timer.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Flip the shutdown signal without draining. Lets the caller await its
    /// background tasks before calling [`BackendServices::shutdown`].
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Signal shutdown and drain: background tasks stop at their next
    /// suspension point, in-flight log records are flushed, the pool closes.
    pub async fn shutdown(self) {
        info!("backend services shutting down");
        let _ = self.shutdown.send(true);

        let producer = Arc::clone(&self.producer);
        let flush = tokio::task::spawn_blocking(move || producer.flush(PRODUCER_FLUSH_TIMEOUT));
        match flush.await {
            Ok(Ok(())) => info!("durable log producer flushed"),
            Ok(Err(error)) => warn!(%error, "failed to flush durable log producer"),
            Err(error) => warn!(%error, "producer flush task failed"),
        }

        self.db_pool.close().await;
        info!("backend services stopped");
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
