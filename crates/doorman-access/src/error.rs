use thiserror::Error;

/// Errors surfaced by the access crate's setup paths.
///
/// The event handlers themselves never return errors: every failure inside
/// a handler is logged and answered on the bus (or silently dropped).
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Invalid access configuration: {field}: {message}")]
    InvalidConfig { field: &'static str, message: String },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] doorman_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, AccessError>;
