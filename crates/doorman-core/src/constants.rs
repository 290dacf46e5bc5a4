//! Core constants for the doorman access control backend.
//!
//! This module centralizes the bus topic names, the default display and
//! actuation durations, and the identifier limits shared by every crate in
//! the workspace.
//!
//! # Door Access Flow
//!
//! A door is opened through three devices talking over MQTT:
//!
//! ```text
//! RFID reader ──rfid/uid──► backend ──keypad/state──► keypad
//! keypad ─────keypad/key──► backend ──doorlock/open─► doorlock
//! ```
//!
//! Topic names and durations are defaults only: every value here can be
//! overridden through configuration.
//!
//! # Usage
//!
//! ```
//! use doorman_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DEFAULT_KEYPAD_STATE_TOPIC, "keypad/state");
//!
//! let timeout = Duration::from_millis(DEFAULT_AWAITING_PASSWORD_MS);
//! assert_eq!(timeout.as_secs(), 8);
//! ```

// ============================================================================
// Bus Topics
// ============================================================================

/// Topic on which RFID readers publish scanned card codes.
///
/// Payload: `{ "deviceId": "...", "rfidUid": "..." }`
pub const DEFAULT_RFID_KEY_TOPIC: &str = "rfid/uid";

/// Topic on which keypads publish the typed password (base64 encoded).
///
/// Payload: `{ "deviceId": "...", "input": "..." }`
pub const DEFAULT_KEYPAD_PASSWORD_TOPIC: &str = "keypad/key";

/// Topic on which the backend publishes keypad display states.
///
/// Payload: `{ "deviceId": "...", "state": "AwaitingPassword", "time": 8000 }`
pub const DEFAULT_KEYPAD_STATE_TOPIC: &str = "keypad/state";

/// Topic on which the backend publishes doorlock unlock commands.
///
/// Payload: `{ "deviceId": "...", "time": 10000 }`
pub const DEFAULT_DOORLOCK_OPEN_TOPIC: &str = "doorlock/open";

/// Topic carrying online/offline status for devices and the backend.
pub const DEFAULT_STATUS_TOPIC: &str = "device-status";

/// Device identifier the backend uses for its own status messages.
pub const BACKEND_DEVICE_ID: &str = "Backend";

// ============================================================================
// Display Durations (milliseconds)
// ============================================================================

/// How long the keypad shows the "incorrect keycard" state.
///
/// # Value: 3000ms
pub const DEFAULT_INCORRECT_KEYCARD_MS: u64 = 3000;

/// How long the keypad shows the "awaiting password" state.
///
/// This is also the default password entry window: a pending session
/// expires when the keypad stops prompting.
///
/// # Value: 8000ms
pub const DEFAULT_AWAITING_PASSWORD_MS: u64 = 8000;

/// How long the keypad shows the "access granted" state.
///
/// # Value: 5000ms
pub const DEFAULT_ACCESS_GRANTED_MS: u64 = 5000;

/// How long the keypad shows the "incorrect password" state.
///
/// # Value: 3000ms
pub const DEFAULT_INCORRECT_PASSWORD_MS: u64 = 3000;

/// How long the doorlock stays open after an unlock command.
///
/// # Value: 10000ms
pub const DEFAULT_DOOR_OPEN_MS: u64 = 10000;

// ============================================================================
// Identifier Constraints
// ============================================================================

/// Maximum length of a device identifier (characters).
///
/// Device firmware derives its id from the chip serial (20 hex characters),
/// the limit leaves room for vendor prefixes.
///
/// # Value: 64 characters
pub const MAX_DEVICE_ID_LENGTH: usize = 64;

/// Maximum length of a card code (characters).
///
/// Card codes arrive as colon-separated UID bytes (`E3:89:6E:AF`); a 10-byte
/// UID formats to 29 characters.
///
/// # Value: 64 characters
pub const MAX_CARD_CODE_LENGTH: usize = 64;

/// Number of trailing card code characters kept visible in logs.
pub const CARD_CODE_VISIBLE_SUFFIX: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_window_matches_prompt_duration() {
        assert_eq!(DEFAULT_AWAITING_PASSWORD_MS, 8000);
        assert!(DEFAULT_DOOR_OPEN_MS > DEFAULT_ACCESS_GRANTED_MS);
    }

    #[test]
    fn test_topics_are_distinct() {
        let topics = [
            DEFAULT_RFID_KEY_TOPIC,
            DEFAULT_KEYPAD_PASSWORD_TOPIC,
            DEFAULT_KEYPAD_STATE_TOPIC,
            DEFAULT_DOORLOCK_OPEN_TOPIC,
            DEFAULT_STATUS_TOPIC,
        ];

        for (i, a) in topics.iter().enumerate() {
            for b in &topics[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
