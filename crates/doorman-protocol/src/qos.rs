//! Delivery guarantee requested for a publish or subscription.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// MQTT quality of service level.
///
/// Every message the access flow emits uses [`QoS::AtLeastOnce`]; devices
/// must tolerate duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QoS {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    pub fn level(self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }

    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(ProtocolError::InvalidQoS(other)),
        }
    }
}

impl fmt::Display for QoS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QoS{}", self.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, QoS::AtMostOnce)]
    #[case(1, QoS::AtLeastOnce)]
    #[case(2, QoS::ExactlyOnce)]
    fn test_from_level(#[case] level: u8, #[case] expected: QoS) {
        assert_eq!(QoS::from_level(level).unwrap(), expected);
        assert_eq!(expected.level(), level);
    }

    #[test]
    fn test_invalid_level() {
        assert!(matches!(QoS::from_level(3), Err(ProtocolError::InvalidQoS(3))));
    }

    #[test]
    fn test_default_is_at_least_once() {
        assert_eq!(QoS::default(), QoS::AtLeastOnce);
        assert_eq!(QoS::default().to_string(), "QoS1");
    }
}
