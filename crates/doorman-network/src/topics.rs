//! Topic names and inbound routing.

use doorman_access::PublishTopics;
use doorman_core::constants::{
    DEFAULT_DOORLOCK_OPEN_TOPIC, DEFAULT_KEYPAD_PASSWORD_TOPIC, DEFAULT_KEYPAD_STATE_TOPIC,
    DEFAULT_RFID_KEY_TOPIC, DEFAULT_STATUS_TOPIC,
};
use serde::Deserialize;

/// What an inbound publish carries, decided by its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    CardScan,
    Password,
    DeviceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttTopics {
    /// Card scans from RFID readers
    pub rfid_key: String,

    /// Base64 passwords from keypads
    pub keypad_password: String,

    pub keypad_state: String,
    pub doorlock_open: String,

    /// Online/offline announcements, including the backend's own
    pub status: String,
}

impl Default for MqttTopics {
    fn default() -> Self {
        Self {
            rfid_key: DEFAULT_RFID_KEY_TOPIC.to_string(),
            keypad_password: DEFAULT_KEYPAD_PASSWORD_TOPIC.to_string(),
            keypad_state: DEFAULT_KEYPAD_STATE_TOPIC.to_string(),
            doorlock_open: DEFAULT_DOORLOCK_OPEN_TOPIC.to_string(),
            status: DEFAULT_STATUS_TOPIC.to_string(),
        }
    }
}

impl MqttTopics {
    /// Topics the backend subscribes to on every connect.
    pub fn subscriptions(&self) -> [&str; 3] {
        [&self.rfid_key, &self.keypad_password, &self.status]
    }

    /// Exact-match routing; wildcards are not used.
    pub fn route(&self, topic: &str) -> Option<Inbound> {
        if topic == self.rfid_key {
            Some(Inbound::CardScan)
        } else if topic == self.keypad_password {
            Some(Inbound::Password)
        } else if topic == self.status {
            Some(Inbound::DeviceStatus)
        } else {
            None
        }
    }

    pub fn publish_topics(&self) -> PublishTopics {
        PublishTopics {
            keypad_state: self.keypad_state.clone(),
            doorlock_open: self.doorlock_open.clone(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let all = [
            ("rfid_key", &self.rfid_key),
            ("keypad_password", &self.keypad_password),
            ("keypad_state", &self.keypad_state),
            ("doorlock_open", &self.doorlock_open),
            ("status", &self.status),
        ];

        for (name, topic) in all {
            if topic.is_empty() {
                return Err(format!("topic '{name}' cannot be empty"));
            }
            if topic.contains(['+', '#']) {
                return Err(format!("topic '{name}' cannot contain wildcards: {topic}"));
            }
        }

        let [scan, password, status] = self.subscriptions();
        if scan == password || scan == status || password == status {
            return Err("subscribed topics must be distinct".to_string());
        }

        Ok(())
    }
}
