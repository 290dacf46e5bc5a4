//! Configuration loading: defaults, then the TOML file, then environment.

use doorman_access::AccessConfig;
use doorman_network::{MqttConfig, NetworkError};
use doorman_storage::DatabaseConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{variable}: {source}")]
    Broker {
        variable: &'static str,
        source: NetworkError,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything the `run` command needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    pub access: AccessConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load `path` if given, then apply environment overrides.
    ///
    /// A missing file is an error only when the path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the deployment's environment variables through `lookup`.
    ///
    /// Numeric variables that do not parse to a positive number are
    /// ignored with a warning, leaving the current value in place.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("MQTT_BROKER") {
            let (host, port) =
                doorman_network::parse_broker_url(url.trim()).map_err(|source| ConfigError::Broker {
                    variable: "MQTT_BROKER",
                    source,
                })?;
            self.mqtt.host = host;
            self.mqtt.port = port;
        }
        if let Some(username) = lookup("MQTT_USERNAME") {
            self.mqtt.username = Some(username);
        }
        if let Some(password) = lookup("MQTT_PASSWORD") {
            self.mqtt.password = Some(password);
        }

        let topics = &mut self.mqtt.topics;
        for (key, topic) in [
            ("MQTT_STATUS_TOPIC", &mut topics.status),
            ("MQTT_RFID_KEY_TOPIC", &mut topics.rfid_key),
            ("MQTT_KEYPAD_STATE_TOPIC", &mut topics.keypad_state),
            ("MQTT_KEYPAD_PASSWORD_TOPIC", &mut topics.keypad_password),
            ("MQTT_DOORLOCK_OPEN_TOPIC", &mut topics.doorlock_open),
        ] {
            if let Some(value) = lookup(key) {
                *topic = value.trim().to_string();
            }
        }

        let access = &mut self.access;
        for (key, ms) in [
            ("MQTT_Access_Granted_STATE_TIME", &mut access.access_granted_ms),
            ("MQTT_Awaiting_Password_STATE_TIME", &mut access.awaiting_password_ms),
            ("MQTT_Incorrect_Keycard_STATE_TIME", &mut access.incorrect_keycard_ms),
            ("MQTT_Incorrect_Password_STATE_TIME", &mut access.incorrect_password_ms),
            ("MQTT_DOOR_OPEN_STATE_TIME", &mut access.door_open_ms),
        ] {
            if let Some(value) = positive(key, lookup(key)) {
                *ms = value;
            }
        }
        if let Some(ms) = positive("DOORMAN_SESSION_TIMEOUT", lookup("DOORMAN_SESSION_TIMEOUT")) {
            access.session_timeout_ms = Some(ms);
        }
        if let Some(max) = positive(
            "DOORMAN_MAX_PASSWORD_ATTEMPTS",
            lookup("DOORMAN_MAX_PASSWORD_ATTEMPTS"),
        ) {
            access.max_password_attempts = Some(max);
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = path;
        }

        Ok(())
    }
}

fn positive<T>(key: &str, value: Option<String>) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let value = value?;
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Some(parsed),
        _ => {
            warn!(variable = key, value = %value, "Ignoring non-positive or non-numeric value");
            None
        }
    }
}
