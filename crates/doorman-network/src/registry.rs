//! Last known presence of every device that announced itself.

use chrono::{DateTime, Utc};
use doorman_core::DeviceId;
use doorman_core::constants::BACKEND_DEVICE_ID;
use doorman_protocol::{DeviceStatus, DeviceStatusMessage};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRecord {
    pub status: DeviceStatus,
    pub last_seen: DateTime<Utc>,
}

/// Informational only: the access flow never consults it.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<HashMap<DeviceId, DeviceRecord>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status announcement seen at `now`. Returns the previous
    /// status, or `None` for a device not seen before.
    ///
    /// The backend's own announcements are skipped.
    pub fn record(&self, message: &DeviceStatusMessage, now: DateTime<Utc>) -> Option<DeviceStatus> {
        if message.device_id.as_str() == BACKEND_DEVICE_ID {
            return None;
        }

        let record = DeviceRecord {
            status: message.status,
            last_seen: now,
        };
        self.devices
            .write()
            .insert(message.device_id.clone(), record)
            .map(|previous| previous.status)
    }

    pub fn get(&self, device_id: &DeviceId) -> Option<DeviceRecord> {
        self.devices.read().get(device_id).copied()
    }

    pub fn is_online(&self, device_id: &DeviceId) -> bool {
        self.get(device_id)
            .is_some_and(|record| record.status == DeviceStatus::Online)
    }

    /// Online devices, sorted by id.
    pub fn online(&self) -> Vec<DeviceId> {
        let mut online: Vec<DeviceId> = self
            .devices
            .read()
            .iter()
            .filter(|(_, record)| record.status == DeviceStatus::Online)
            .map(|(id, _)| id.clone())
            .collect();
        online.sort();
        online
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}
