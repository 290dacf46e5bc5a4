//! Timing and policy configuration for the access flow.

use crate::error::{AccessError, Result};
use doorman_core::constants::{
    DEFAULT_ACCESS_GRANTED_MS, DEFAULT_AWAITING_PASSWORD_MS, DEFAULT_DOOR_OPEN_MS,
    DEFAULT_INCORRECT_KEYCARD_MS, DEFAULT_INCORRECT_PASSWORD_MS,
};
use doorman_protocol::KeypadState;
use serde::Deserialize;
use std::time::Duration;

/// Display durations, unlock duration and session policy.
///
/// The password entry window defaults to the `AwaitingPassword` display
/// duration so the window closes when the keypad stops prompting. Setting
/// `session_timeout_ms` decouples the two.
///
/// # Examples
///
/// ```
/// use doorman_access::AccessConfig;
/// use doorman_protocol::KeypadState;
/// use std::time::Duration;
///
/// let config = AccessConfig::default()
///     .with_display_time(KeypadState::AwaitingPassword, 12_000)
///     .with_max_password_attempts(3);
///
/// assert_eq!(config.session_timeout(), Duration::from_secs(12));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub incorrect_keycard_ms: u64,
    pub awaiting_password_ms: u64,
    pub access_granted_ms: u64,
    pub incorrect_password_ms: u64,

    /// How long the doorlock stays open after an unlock command
    pub door_open_ms: u64,

    /// Password entry window; `None` follows `awaiting_password_ms`
    pub session_timeout_ms: Option<u64>,

    /// Wrong passwords tolerated per session; `None` allows retries until
    /// the window closes
    pub max_password_attempts: Option<u32>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            incorrect_keycard_ms: DEFAULT_INCORRECT_KEYCARD_MS,
            awaiting_password_ms: DEFAULT_AWAITING_PASSWORD_MS,
            access_granted_ms: DEFAULT_ACCESS_GRANTED_MS,
            incorrect_password_ms: DEFAULT_INCORRECT_PASSWORD_MS,
            door_open_ms: DEFAULT_DOOR_OPEN_MS,
            session_timeout_ms: None,
            max_password_attempts: None,
        }
    }
}

impl AccessConfig {
    /// Milliseconds the keypad shows `state`.
    pub fn display_time(&self, state: KeypadState) -> u64 {
        match state {
            KeypadState::IncorrectKeycard => self.incorrect_keycard_ms,
            KeypadState::AwaitingPassword => self.awaiting_password_ms,
            KeypadState::AccessGranted => self.access_granted_ms,
            KeypadState::IncorrectPassword => self.incorrect_password_ms,
        }
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms.unwrap_or(self.awaiting_password_ms))
    }

    pub fn with_display_time(mut self, state: KeypadState, ms: u64) -> Self {
        let slot = match state {
            KeypadState::IncorrectKeycard => &mut self.incorrect_keycard_ms,
            KeypadState::AwaitingPassword => &mut self.awaiting_password_ms,
            KeypadState::AccessGranted => &mut self.access_granted_ms,
            KeypadState::IncorrectPassword => &mut self.incorrect_password_ms,
        };
        *slot = ms;
        self
    }

    pub fn with_door_open(mut self, ms: u64) -> Self {
        self.door_open_ms = ms;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_max_password_attempts(mut self, attempts: u32) -> Self {
        self.max_password_attempts = Some(attempts);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("incorrect_keycard_ms", self.incorrect_keycard_ms),
            ("awaiting_password_ms", self.awaiting_password_ms),
            ("access_granted_ms", self.access_granted_ms),
            ("incorrect_password_ms", self.incorrect_password_ms),
            ("door_open_ms", self.door_open_ms),
            ("session_timeout_ms", self.session_timeout_ms.unwrap_or(1)),
        ];

        if let Some(&(field, _)) = durations.iter().find(|(_, ms)| *ms == 0) {
            return Err(AccessError::InvalidConfig {
                field,
                message: "duration must be greater than zero".to_string(),
            });
        }

        if self.max_password_attempts == Some(0) {
            return Err(AccessError::InvalidConfig {
                field: "max_password_attempts",
                message: "must allow at least one attempt".to_string(),
            });
        }

        Ok(())
    }
}
