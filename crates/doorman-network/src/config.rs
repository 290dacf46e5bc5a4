//! Broker connection settings.

use crate::error::{NetworkError, Result};
use crate::topics::MqttTopics;
use bytes::Bytes;
use doorman_core::DeviceId;
use doorman_core::constants::BACKEND_DEVICE_ID;
use doorman_protocol::{DeviceStatus, DeviceStatusMessage, encode};
use rumqttc::{LastWill, MqttOptions};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// MQTT connection settings.
///
/// Loadable from the `[mqtt]` table of the configuration file; every field
/// is optional there.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Keep-alive interval in seconds
    pub keep_alive_secs: u64,

    /// Bound of the request channel between clients and the event loop
    pub capacity: usize,

    /// Pause between reconnect attempts after a connection error
    pub retry_delay_ms: u64,

    pub topics: MqttTopics,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_MQTT_PORT,
            client_id: "doorman-backend".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            capacity: 64,
            retry_delay_ms: 5000,
            topics: MqttTopics::default(),
        }
    }
}

impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("capacity", &self.capacity)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("topics", &self.topics)
            .finish()
    }
}

impl MqttConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Point at the broker named by a `mqtt://host:port` URL.
    pub fn with_broker_url(mut self, url: &str) -> Result<Self> {
        let (host, port) = parse_broker_url(url)?;
        self.host = host;
        self.port = port;
        Ok(self)
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_topics(mut self, topics: MqttTopics) -> Self {
        self.topics = topics;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject settings the MQTT client would panic on or that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(NetworkError::InvalidConfig("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(NetworkError::InvalidConfig("port cannot be 0".to_string()));
        }
        if self.client_id.is_empty() || self.client_id.starts_with(' ') {
            return Err(NetworkError::InvalidConfig(format!(
                "invalid client id '{}'",
                self.client_id
            )));
        }
        if self.capacity == 0 {
            return Err(NetworkError::InvalidConfig("capacity must be at least 1".to_string()));
        }
        if self.retry_delay_ms == 0 {
            return Err(NetworkError::InvalidConfig(
                "retry_delay_ms must be greater than zero".to_string(),
            ));
        }
        self.topics.validate().map_err(NetworkError::InvalidConfig)
    }

    /// Client options with credentials and the backend's offline last will.
    pub fn options(&self) -> Result<MqttOptions> {
        self.validate()?;

        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options
            .set_keep_alive(Duration::from_secs(self.keep_alive_secs))
            .set_clean_session(true);

        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.clone().unwrap_or_default());
        }

        let will = backend_status(DeviceStatus::Offline)?;
        options.set_last_will(LastWill::new(
            &self.topics.status,
            will.to_vec(),
            rumqttc::QoS::AtLeastOnce,
            true,
        ));

        Ok(options)
    }
}

/// Status payload announcing the backend itself.
pub fn backend_status(status: DeviceStatus) -> Result<Bytes> {
    let message = DeviceStatusMessage::new(DeviceId::new(BACKEND_DEVICE_ID)?, status);
    Ok(encode(&message)?)
}

/// Split `mqtt://host:port` (or `tcp://`, or a bare `host:port`) into its
/// parts. The port defaults to 1883. TLS and websocket schemes are refused.
pub fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let invalid = |message: &str| NetworkError::InvalidBrokerUrl {
        url: url.to_string(),
        message: message.to_string(),
    };

    let rest = match url.split_once("://") {
        Some(("mqtt" | "tcp", rest)) => rest,
        Some((scheme, _)) => return Err(invalid(&format!("unsupported scheme '{scheme}'"))),
        None => url,
    };
    let authority = rest.split('/').next().unwrap_or_default();
    if authority.contains('@') {
        return Err(invalid("credentials belong in MQTT_USERNAME/MQTT_PASSWORD"));
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) if !host.ends_with(':') => {
            let port = port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;
            (host, port)
        }
        _ => (authority, DEFAULT_MQTT_PORT),
    };

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    if port == 0 {
        return Err(invalid("port cannot be 0"));
    }

    Ok((host.to_string(), port))
}
