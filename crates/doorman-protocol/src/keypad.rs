//! Keypad display states and the outbound state notification.
//!
//! The backend drives the keypad display by publishing one of four states
//! together with how long the keypad should show it:
//!
//! ```text
//! { "deviceId": "515351333120A8470F0F", "state": "AwaitingPassword", "time": 8000 }
//! ```

use crate::error::ProtocolError;
use doorman_core::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State shown on a keypad display.
///
/// The serialized names are the exact strings keypad firmware matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeypadState {
    IncorrectKeycard,
    AwaitingPassword,
    AccessGranted,
    IncorrectPassword,
}

impl KeypadState {
    pub const ALL: [KeypadState; 4] = [
        KeypadState::IncorrectKeycard,
        KeypadState::AwaitingPassword,
        KeypadState::AccessGranted,
        KeypadState::IncorrectPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeypadState::IncorrectKeycard => "IncorrectKeycard",
            KeypadState::AwaitingPassword => "AwaitingPassword",
            KeypadState::AccessGranted => "AccessGranted",
            KeypadState::IncorrectPassword => "IncorrectPassword",
        }
    }

    /// Whether the state reports a rejected credential.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            KeypadState::IncorrectKeycard | KeypadState::IncorrectPassword
        )
    }
}

impl fmt::Display for KeypadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeypadState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownKeypadState(s.to_string()))
    }
}

/// Outbound notification telling a keypad what to display and for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypadStateMessage {
    pub device_id: DeviceId,
    pub state: KeypadState,
    /// Display duration in milliseconds.
    pub time: u64,
}

impl KeypadStateMessage {
    pub fn new(device_id: DeviceId, state: KeypadState, time: u64) -> Self {
        Self {
            device_id,
            state,
            time,
        }
    }
}
