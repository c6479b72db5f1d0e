use actix_web::{middleware, web, App, HttpServer};
use notify_service::{
    handlers::{
        notifications::register_routes as register_notifications,
        stream::register_routes as register_stream,
    },
    BatchConfig, BatchDispatcher, Config, GroupingStrategy, MemoryStore, NotificationStore,
    StreamManager,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The batch families delivery is partitioned into, one per kind category.
fn batch_configs(config: &Config) -> Vec<BatchConfig> {
    let strategy = GroupingStrategy::parse(&config.batch.strategy);
    let max_wait = Duration::from_secs(config.batch.max_wait_secs);
    ["ticket", "sla", "system"]
        .into_iter()
        .map(|key| BatchConfig::new(key, config.batch.max_batch_size, max_wait, strategy))
        .collect()
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting notify service");

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config error: {e}"))?;

    let store: Arc<dyn NotificationStore> = Arc::new(MemoryStore::new(config.store.retention));
    let stream_manager = Arc::new(StreamManager::new());
    let dispatcher = Arc::new(BatchDispatcher::new(
        batch_configs(&config),
        stream_manager.clone(),
    ));

    // Background loops: heartbeats keep client failure counters at zero,
    // the flush sweep enforces the batch wait bound.
    let _heartbeat = stream_manager
        .clone()
        .spawn_heartbeat_task(Duration::from_secs(config.stream.heartbeat_secs));
    let _flusher = dispatcher
        .clone()
        .spawn_flush_task(Duration::from_secs(config.batch.flush_tick_secs));

    let addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!(%addr, env = %config.app.env, "Starting HTTP server");

    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(stream_manager.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(app_config.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .configure(|cfg| {
                register_stream(cfg);
                register_notifications(cfg);
            })
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
