//! `doorman`: RFID + keypad door access backend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doorman_storage::{Database, SqliteDoorRepository};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "doorman", version)]
#[command(about = "Two-factor door access over MQTT: RFID card, then keypad password", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "DOORMAN_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the config file and DATABASE_PATH
    #[arg(long, global = true)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to the broker and serve door access (default)
    Run,

    /// Create or upgrade the database schema
    Migrate,

    /// Load doors and issued cards from a TOML file
    Seed {
        /// Seed file
        file: PathBuf,
    },

    /// Print an argon2id hash for a keypad password
    HashPassword {
        /// Password to hash; read from stdin when omitted
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = if cli.verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::run(config).await?,
        Command::Migrate => commands::migrate(config.database).await?,
        Command::Seed { file } => {
            let seed = commands::SeedFile::load(&file)?;
            let db = Database::new(config.database)
                .await
                .context("Failed to open database")?;
            let repository = SqliteDoorRepository::new(db.pool().clone());

            let summary = commands::seed(&repository, seed).await;
            db.close().await;
            let summary = summary?;
            info!(
                doors = summary.doors,
                cards = summary.cards,
                grants = summary.grants,
                "Seed complete"
            );
        }
        Command::HashPassword { password } => {
            println!("{}", commands::hash_password(password)?);
        }
    }

    Ok(())
}
