use super::DoorRepository;
use crate::error::StorageResult;
use crate::models::{Door, DoorAccess};
use doorman_core::{CardCode, DeviceId, DoorId};
use parking_lot::RwLock;

/// Door repository held entirely in memory.
///
/// Used by tests and by demo deployments seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryDoorRepository {
    doors: RwLock<Vec<DoorAccess>>,
}

impl InMemoryDoorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_door(self, access: DoorAccess) -> Self {
        self.insert(access);
        self
    }

    /// Add a door, replacing any door with the same id.
    pub fn insert(&self, access: DoorAccess) {
        let mut doors = self.doors.write();
        doors.retain(|existing| existing.door.id != access.door.id);
        doors.push(access);
    }

    pub fn remove(&self, door_id: &DoorId) -> bool {
        let mut doors = self.doors.write();
        let before = doors.len();
        doors.retain(|existing| existing.door.id != *door_id);
        doors.len() != before
    }

    /// Activate or deactivate a physical card on every door that lists it.
    pub fn set_card_active(&self, code: &CardCode, active: bool) -> bool {
        let mut changed = false;
        for access in self.doors.write().iter_mut() {
            for grant in access.grants.iter_mut().filter(|g| g.card_code == *code) {
                grant.card_active = active;
                changed = true;
            }
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.doors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.read().is_empty()
    }

    fn lookup_reader(&self, reader_id: &DeviceId) -> Option<DoorAccess> {
        self.doors
            .read()
            .iter()
            .find(|access| access.door.reader_device_id == *reader_id)
            .cloned()
    }

    fn lookup_keypad(&self, keypad_id: &DeviceId) -> Option<Door> {
        self.doors
            .read()
            .iter()
            .find(|access| access.door.keypad_device_id == *keypad_id)
            .map(|access| access.door.clone())
    }
}

impl DoorRepository for InMemoryDoorRepository {
    async fn find_door_by_reader_id(&self, reader_id: &DeviceId) -> StorageResult<Option<DoorAccess>> {
        Ok(self.lookup_reader(reader_id))
    }

    async fn find_door_by_keypad_id(&self, keypad_id: &DeviceId) -> StorageResult<Option<Door>> {
        Ok(self.lookup_keypad(keypad_id))
    }
}
