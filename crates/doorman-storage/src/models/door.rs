use super::AccessGrant;
use doorman_core::{CardCode, DeviceId, DoorId, DoorStatus};
use serde::{Deserialize, Serialize};

/// A physical door and the three devices wired to it.
///
/// Each device id belongs to at most one door, which is what lets an
/// inbound event be routed back to its door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub id: DoorId,
    pub reader_device_id: DeviceId,
    pub keypad_device_id: DeviceId,
    pub doorlock_device_id: DeviceId,
    /// Carried for administration; the access flow does not consult it.
    pub status: DoorStatus,
}

impl Door {
    pub fn new(
        id: DoorId,
        reader_device_id: DeviceId,
        keypad_device_id: DeviceId,
        doorlock_device_id: DeviceId,
    ) -> Self {
        Self {
            id,
            reader_device_id,
            keypad_device_id,
            doorlock_device_id,
            status: DoorStatus::Active,
        }
    }

    pub fn with_status(mut self, status: DoorStatus) -> Self {
        self.status = status;
        self
    }
}

/// A door together with every grant that may open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorAccess {
    pub door: Door,
    pub grants: Vec<AccessGrant>,
}

impl DoorAccess {
    pub fn new(door: Door, grants: Vec<AccessGrant>) -> Self {
        Self { door, grants }
    }

    /// First grant whose card matches `code` exactly and is still active.
    pub fn find_active_grant(&self, code: &CardCode) -> Option<&AccessGrant> {
        self.grants.iter().find(|grant| grant.admits(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorman_core::GrantId;

    fn door() -> Door {
        Door::new(
            DoorId::new("door-1").unwrap(),
            DeviceId::new("reader-1").unwrap(),
            DeviceId::new("keypad-1").unwrap(),
            DeviceId::new("lock-1").unwrap(),
        )
    }

    fn grant(id: &str, code: &str, active: bool) -> AccessGrant {
        AccessGrant::new(
            GrantId::new(id).unwrap(),
            CardCode::new(code).unwrap(),
            active,
            "$argon2id$placeholder",
        )
    }

    #[test]
    fn test_new_door_is_active() {
        let door = door();
        assert!(door.status.is_active());
        assert_eq!(
            door.with_status(DoorStatus::Inactive).status,
            DoorStatus::Inactive
        );
    }

    #[test]
    fn test_find_active_grant_skips_inactive_cards() {
        let access = DoorAccess::new(
            door(),
            vec![
                grant("uk-1", "E3:89:6E:AF", false),
                grant("uk-2", "FE:79:D8:03", true),
            ],
        );

        assert!(access
            .find_active_grant(&CardCode::new("E3:89:6E:AF").unwrap())
            .is_none());

        let found = access
            .find_active_grant(&CardCode::new("FE:79:D8:03").unwrap())
            .unwrap();
        assert_eq!(found.id.as_str(), "uk-2");
    }

    #[test]
    fn test_find_active_grant_is_case_sensitive() {
        let access = DoorAccess::new(door(), vec![grant("uk-1", "e3:89:6e:af", true)]);

        assert!(access
            .find_active_grant(&CardCode::new("E3:89:6E:AF").unwrap())
            .is_none());
    }
}
