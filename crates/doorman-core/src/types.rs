use crate::{
    Result,
    constants::{CARD_CODE_VISIBLE_SUFFIX, MAX_CARD_CODE_LENGTH, MAX_DEVICE_ID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_graphic()
}

/// Identifier of a bus-attached device (reader, keypad or doorlock).
///
/// Devices derive their id from the chip serial, e.g. `515351333120A8470F0F`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new device ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceId` if the ID is empty, longer than
    /// 64 characters, or contains whitespace or non-ASCII characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::InvalidDeviceId {
                message: "Device ID must not be empty".to_string(),
            });
        }

        if id.len() > MAX_DEVICE_ID_LENGTH {
            return Err(Error::InvalidDeviceId {
                message: format!(
                    "Device ID must be at most {MAX_DEVICE_ID_LENGTH} chars, got {}",
                    id.len()
                ),
            });
        }

        if !id.chars().all(is_identifier_char) {
            return Err(Error::InvalidDeviceId {
                message: format!("Device ID contains invalid characters: {id:?}"),
            });
        }

        Ok(DeviceId(id))
    }

    /// Get the device ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceId::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceId::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

/// Identifier of a door record, owned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoorId(String);

impl DoorId {
    /// Create a new door ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidDoorId` if the ID is empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidDoorId {
                message: "Door ID must not be blank".to_string(),
            });
        }
        Ok(DoorId(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DoorId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DoorId::new(value)
    }
}

impl From<DoorId> for String {
    fn from(value: DoorId) -> Self {
        value.0
    }
}

/// Identifier of the keycard holder credential a grant refers to.
///
/// The password typed on the keypad is checked against the hash stored for
/// this holder/card pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GrantId(String);

impl GrantId {
    /// Create a new grant ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidGrantId` if the ID is blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidGrantId("Grant ID must not be blank".to_string()));
        }
        Ok(GrantId(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GrantId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        GrantId::new(value)
    }
}

impl From<GrantId> for String {
    fn from(value: GrantId) -> Self {
        value.0
    }
}

/// Physical card code as reported by an RFID reader (e.g. `E3:89:6E:AF`).
///
/// Codes are compared exactly as presented: no case folding or trimming,
/// so the stored code must match what the reader firmware emits.
///
/// # Security
/// This type implements constant-time comparison to prevent timing attacks
/// when matching a presented card against the door's grants. Its `Debug`
/// and `Display` output is masked; use [`CardCode::as_str`] when the full
/// value is really needed.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardCode(String);

impl CardCode {
    /// Create a new card code with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardCode` if the code is empty, longer than
    /// 64 characters, or contains whitespace or non-ASCII characters.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();

        if code.is_empty() || code.len() > MAX_CARD_CODE_LENGTH {
            return Err(Error::InvalidCardCode(format!(
                "Card code must be 1-{MAX_CARD_CODE_LENGTH} chars, got {}",
                code.len()
            )));
        }

        if !code.chars().all(is_identifier_char) {
            return Err(Error::InvalidCardCode(
                "Card code must be printable ASCII".to_string(),
            ));
        }

        Ok(CardCode(code))
    }

    /// Get the card code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked rendering for logs: everything but the last four characters
    /// is replaced with `*`.
    #[must_use]
    pub fn masked(&self) -> String {
        mask_card_code(&self.0)
    }
}

/// Mask an unvalidated card code for logging, keeping the last four
/// characters visible.
#[must_use]
pub fn mask_card_code(code: &str) -> String {
    let len = code.chars().count();
    let hidden = len.saturating_sub(CARD_CODE_VISIBLE_SUFFIX);
    code.chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}

/// Constant-time comparison implementation for CardCode
impl PartialEq for CardCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CardCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for CardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CardCode").field(&self.masked()).finish()
    }
}

impl fmt::Display for CardCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl std::str::FromStr for CardCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardCode::new(s)
    }
}

impl TryFrom<String> for CardCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        CardCode::new(value)
    }
}

impl From<CardCode> for String {
    fn from(value: CardCode) -> Self {
        value.0
    }
}

/// Activation status of a door record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoorStatus {
    Active,
    Inactive,
}

impl DoorStatus {
    /// Parse the status as stored in the database (`ACTIVE` / `INACTIVE`).
    ///
    /// # Errors
    /// Returns `Error::UnknownDoorStatus` for any other value.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "ACTIVE" => Ok(DoorStatus::Active),
            "INACTIVE" => Ok(DoorStatus::Inactive),
            other => Err(Error::UnknownDoorStatus(other.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoorStatus::Active => "ACTIVE",
            DoorStatus::Inactive => "INACTIVE",
        }
    }

    /// Returns `true` if the door is active.
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, DoorStatus::Active)
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
