//! Outbound keypad state and doorlock notifications.
//!
//! Publishing is fire-and-forget: a failure is logged and never retried,
//! and never rolls back the session change that triggered it. Retrying an
//! unlock risks opening the door twice.

use crate::bus::{Bus, BusError};
use crate::config::AccessConfig;
use crate::status::AccessStatus;
use doorman_core::DeviceId;
use doorman_core::constants::{DEFAULT_DOORLOCK_OPEN_TOPIC, DEFAULT_KEYPAD_STATE_TOPIC};
use doorman_protocol::{DoorlockUnlockMessage, KeypadState, KeypadStateMessage, QoS, encode};
use serde::Serialize;
use tracing::{debug, error, info};

/// Topics the access flow publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTopics {
    pub keypad_state: String,
    pub doorlock_open: String,
}

impl Default for PublishTopics {
    fn default() -> Self {
        Self {
            keypad_state: DEFAULT_KEYPAD_STATE_TOPIC.to_string(),
            doorlock_open: DEFAULT_DOORLOCK_OPEN_TOPIC.to_string(),
        }
    }
}

pub struct MessagePublisher<B> {
    bus: B,
    topics: PublishTopics,
    config: AccessConfig,
}

impl<B: Bus> MessagePublisher<B> {
    pub fn new(bus: B, topics: PublishTopics, config: AccessConfig) -> Self {
        Self {
            bus,
            topics,
            config,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn topics(&self) -> &PublishTopics {
        &self.topics
    }

    /// Show `state` on a keypad for its configured duration.
    pub async fn keypad_state(&self, keypad: &DeviceId, state: KeypadState) {
        let time = self.config.display_time(state);
        let message = KeypadStateMessage::new(keypad.clone(), state, time);

        match self.send(&self.topics.keypad_state, &message).await {
            Ok(()) => debug!(
                device_id = %keypad,
                state = %state,
                time,
                topic = %self.topics.keypad_state,
                "Keypad state published"
            ),
            Err(e) => error!(
                device_id = %keypad,
                state = %state,
                topic = %self.topics.keypad_state,
                error = %e,
                "Failed to publish keypad state"
            ),
        }
    }

    /// Open a doorlock for the configured duration.
    pub async fn unlock(&self, doorlock: &DeviceId) {
        let time = self.config.door_open_ms;
        let message = DoorlockUnlockMessage::new(doorlock.clone(), time);

        match self.send(&self.topics.doorlock_open, &message).await {
            Ok(()) => info!(
                device_id = %doorlock,
                time,
                access_status = %AccessStatus::DoorUnlocked,
                "Door unlock command sent"
            ),
            Err(e) => error!(
                device_id = %doorlock,
                topic = %self.topics.doorlock_open,
                error = %e,
                "Failed to publish door unlock"
            ),
        }
    }

    async fn send<T: Serialize>(&self, topic: &str, message: &T) -> Result<(), BusError> {
        let payload = encode(message)?;
        self.bus.publish(topic, payload, QoS::AtLeastOnce, false).await
    }
}
