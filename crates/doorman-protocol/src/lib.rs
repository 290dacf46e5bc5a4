//! Bus payloads exchanged between the backend and the door devices.
//!
//! Every payload is a JSON object with camelCase keys. Inbound messages
//! (card scans, keypad passwords, device status) are validated while they
//! are decoded, so handlers only ever see well-formed identifiers.

pub mod codec;
pub mod error;
pub mod keypad;
pub mod message;
pub mod qos;

pub use codec::{decode, encode};
pub use error::{ProtocolError, Result};
pub use keypad::{KeypadState, KeypadStateMessage};
pub use message::{
    CardScanMessage, DeviceStatus, DeviceStatusMessage, DoorlockUnlockMessage,
    KeypadPasswordMessage,
};
pub use qos::QoS;
