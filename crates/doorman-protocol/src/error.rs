use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Empty payload")]
    EmptyPayload,

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown keypad state: {0}")]
    UnknownKeypadState(String),

    #[error("Unknown device status: {0}")]
    UnknownDeviceStatus(String),

    #[error("Invalid QoS level: {0}")]
    InvalidQoS(u8),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
