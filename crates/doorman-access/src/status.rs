use std::fmt;

/// Audit outcome attached to handler log events as `access_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessStatus {
    CorrectKeycard,
    IncorrectKeycard,
    CorrectPassword,
    IncorrectPassword,
    SessionTimeout,
    AccessGranted,
    DoorUnlocked,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::CorrectKeycard => "CORRECT_KEYCARD",
            AccessStatus::IncorrectKeycard => "INCORRECT_KEYCARD",
            AccessStatus::CorrectPassword => "CORRECT_PASSWORD",
            AccessStatus::IncorrectPassword => "INCORRECT_PASSWORD",
            AccessStatus::SessionTimeout => "SESSION_TIMEOUT",
            AccessStatus::AccessGranted => "ACCESS_GRANTED",
            AccessStatus::DoorUnlocked => "DOOR_UNLOCKED",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
