use dotenvy::dotenv;
use log::*;
use takeout_engine::{events::EventHandlers, SqliteDatabase};
use takeout_server::{
    broadcast::PushBroadcaster,
    config::ServerConfig,
    errors::ServerError,
    push_hooks,
    sweep_worker::start_sweep_worker,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = ServerConfig::from_env_or_default();
    info!("🚀️ Starting takeout backend against {}", config.database_url);
    match run(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    sqlx::migrate!("../takeout_engine/src/sqlite/migrations").run(db.pool()).await?;
    info!("🚀️ Migrations complete");

    let broadcaster = PushBroadcaster::new();
    let handlers = EventHandlers::new(25, push_hooks(broadcaster.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("🚀️ Event handlers started");

    let _sweep = start_sweep_worker(db, producers, config.sweep_interval_secs, config.payment_timeout);

    tokio::signal::ctrl_c().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Shutdown signal received");
    Ok(())
}
