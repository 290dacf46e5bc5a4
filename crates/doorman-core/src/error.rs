use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Identifier errors
    #[error("Invalid device ID: {message}")]
    InvalidDeviceId { message: String },

    #[error("Invalid door ID: {message}")]
    InvalidDoorId { message: String },

    #[error("Invalid card code: {0}")]
    InvalidCardCode(String),

    #[error("Invalid grant ID: {0}")]
    InvalidGrantId(String),

    #[error("Unknown door status: {0}")]
    UnknownDoorStatus(String),
}

pub type Result<T> = std::result::Result<T, Error>;
