//! `doorman migrate`: create or upgrade the database schema.

use anyhow::{Context, Result};
use doorman_storage::{Database, DatabaseConfig};
use tracing::info;

pub async fn migrate(config: DatabaseConfig) -> Result<()> {
    let path = config.path.clone();
    let db = Database::new(config.auto_migrate(false))
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;

    db.migrate().await.context("Migration failed")?;
    db.close().await;

    info!(path = %path, "Database schema is up to date");
    Ok(())
}
