use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Invalid broker URL '{url}': {message}")]
    InvalidBrokerUrl { url: String, message: String },

    #[error("Invalid MQTT configuration: {0}")]
    InvalidConfig(String),

    #[error("MQTT client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Payload encoding failed: {0}")]
    Encode(#[from] doorman_protocol::ProtocolError),

    #[error(transparent)]
    Identifier(#[from] doorman_core::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
