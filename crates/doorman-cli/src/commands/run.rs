//! `doorman run`: serve the access flow until SIGINT/SIGTERM.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use doorman_access::{AccessService, Argon2Verifier, SessionStore, ShutdownCoordinator};
use doorman_network::{MqttBus, MqttListener};
use doorman_storage::{Database, SqliteDoorRepository};
use tracing::info;

pub async fn run(config: AppConfig) -> Result<()> {
    info!(
        broker = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
        database = %config.database.path,
        session_timeout_ms = config.access.session_timeout().as_millis() as u64,
        max_password_attempts = ?config.access.max_password_attempts,
        "Starting doorman"
    );

    let db = Database::new(config.database.clone())
        .await
        .context("Failed to open database")?;
    let repository = SqliteDoorRepository::new(db.pool().clone());

    let (bus, eventloop) = MqttBus::connect(&config.mqtt).context("Invalid MQTT configuration")?;

    let store = SessionStore::new();
    let shutdown = ShutdownCoordinator::new(store.clone());
    let service = AccessService::with_store(
        repository,
        bus.clone(),
        Argon2Verifier::new(),
        config.mqtt.topics.publish_topics(),
        config.access.clone(),
        store,
    )
    .context("Invalid access configuration")?;

    let mut listener = MqttListener::new(bus.client().clone(), eventloop, service, &config.mqtt);
    let signals = shutdown.spawn_signal_listener();

    listener.run(shutdown.token()).await;

    listener.drain().await;
    shutdown.clear_sessions();
    listener.disconnect().await;
    db.close().await;
    let _ = signals.await;

    info!("Doorman stopped");
    Ok(())
}
