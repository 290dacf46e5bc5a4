use crate::error::ProtocolError;
use doorman_core::{CardCode, DeviceId, mask_card_code};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Card presented to an RFID reader.
///
/// ```text
/// { "deviceId": "<reader id>", "rfidUid": "E3:89:6E:AF" }
/// ```
///
/// `rfid_uid` is kept as sent. A code that is not a valid [`CardCode`]
/// still belongs to a known reader and is rejected like any unknown card.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardScanMessage {
    pub device_id: DeviceId,
    pub rfid_uid: String,
}

impl CardScanMessage {
    pub fn new(device_id: DeviceId, rfid_uid: impl Into<String>) -> Self {
        Self {
            device_id,
            rfid_uid: rfid_uid.into(),
        }
    }

    /// Validate the presented code.
    pub fn card_code(&self) -> doorman_core::Result<CardCode> {
        CardCode::new(self.rfid_uid.as_str())
    }

    pub fn masked_uid(&self) -> String {
        mask_card_code(&self.rfid_uid)
    }
}

impl fmt::Debug for CardScanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardScanMessage")
            .field("device_id", &self.device_id)
            .field("rfid_uid", &self.masked_uid())
            .finish()
    }
}

/// Password typed on a keypad, base64 encoded by the keypad firmware.
///
/// The payload is kept encoded; decoding is part of verification so that a
/// malformed payload is indistinguishable from a wrong password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypadPasswordMessage {
    pub device_id: DeviceId,
    pub input: String,
}

impl fmt::Debug for KeypadPasswordMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypadPasswordMessage")
            .field("device_id", &self.device_id)
            .field("input", &"<redacted>")
            .finish()
    }
}

/// Command opening a doorlock for `time` milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorlockUnlockMessage {
    pub device_id: DeviceId,
    pub time: u64,
}

impl DoorlockUnlockMessage {
    pub fn new(device_id: DeviceId, time: u64) -> Self {
        Self { device_id, time }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(DeviceStatus::Online),
            "offline" => Ok(DeviceStatus::Offline),
            other => Err(ProtocolError::UnknownDeviceStatus(other.to_string())),
        }
    }
}

/// Presence announcement published by devices and by the backend itself
/// (retained, with the offline variant registered as last will).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusMessage {
    pub device_id: DeviceId,
    pub status: DeviceStatus,
}

impl DeviceStatusMessage {
    pub fn new(device_id: DeviceId, status: DeviceStatus) -> Self {
        Self { device_id, status }
    }

    pub fn online(device_id: DeviceId) -> Self {
        Self::new(device_id, DeviceStatus::Online)
    }

    pub fn offline(device_id: DeviceId) -> Self {
        Self::new(device_id, DeviceStatus::Offline)
    }
}
