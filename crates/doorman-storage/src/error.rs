use thiserror::Error;

/// Failures surfaced by the door repository and its connection pool.
///
/// Lookups that find nothing are not errors; repositories return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Query or pool failure reported by sqlx
    #[error("sqlite: {0}")]
    Database(#[from] sqlx::Error),

    /// A schema migration could not be applied
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row holds a value the domain types reject
    #[error("Invalid stored data in {table}: {message}")]
    InvalidRow { table: &'static str, message: String },

    /// Rejected `DatabaseConfig` values
    #[error("invalid database config: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn invalid_row(table: &'static str, err: doorman_core::Error) -> Self {
        StorageError::InvalidRow {
            table,
            message: err.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
