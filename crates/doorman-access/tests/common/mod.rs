//! Shared fixtures for the access flow integration tests.

#![allow(dead_code)]

use argon2::Params;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use doorman_access::{
    AccessConfig, AccessService, Argon2Verifier, Bus, BusError, CredentialVerifier, PublishTopics,
    VerifyOutcome, hash_password_with,
};
use doorman_core::{CardCode, DeviceId, DoorId, GrantId};
use doorman_protocol::{
    CardScanMessage, DoorlockUnlockMessage, KeypadPasswordMessage, KeypadState, KeypadStateMessage,
    QoS, decode,
};
use doorman_storage::{
    AccessGrant, Door, DoorAccess, DoorRepository, InMemoryDoorRepository, StorageError,
    StorageResult,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub const READER: &str = "515351333120A8470F0F";
pub const KEYPAD: &str = "515351333120484E411F";
pub const LOCK: &str = "304242375241C9033432";

pub const ACTIVE_CARD: &str = "E3:89:6E:AF";
pub const INACTIVE_CARD: &str = "FE:79:D8:03";
pub const PASSWORD: &str = "1234";

#[derive(Debug, Clone)]
pub struct Published {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

/// Bus double that records every publish.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    published: Arc<Mutex<Vec<Published>>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    pub fn keypad_states(&self) -> Vec<KeypadStateMessage> {
        self.published()
            .iter()
            .filter(|p| p.topic == "keypad/state")
            .map(|p| decode(&p.payload).unwrap())
            .collect()
    }

    pub fn states(&self) -> Vec<KeypadState> {
        self.keypad_states().into_iter().map(|m| m.state).collect()
    }

    pub fn unlocks(&self) -> Vec<DoorlockUnlockMessage> {
        self.published()
            .iter()
            .filter(|p| p.topic == "doorlock/open")
            .map(|p| decode(&p.payload).unwrap())
            .collect()
    }

    pub fn count(&self, state: KeypadState) -> usize {
        self.states().into_iter().filter(|s| *s == state).count()
    }

    pub fn is_empty(&self) -> bool {
        self.published.lock().is_empty()
    }
}

impl Bus for RecordingBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: QoS,
        retain: bool,
    ) -> Result<(), BusError> {
        self.published.lock().push(Published {
            topic: topic.to_string(),
            payload,
            qos,
            retain,
        });
        Ok(())
    }
}

/// Bus double whose every publish fails.
#[derive(Debug, Clone, Default)]
pub struct BrokenBus;

impl Bus for BrokenBus {
    async fn publish(&self, topic: &str, _: Bytes, _: QoS, _: bool) -> Result<(), BusError> {
        Err(BusError::Publish {
            topic: topic.to_string(),
            message: "broker unreachable".to_string(),
        })
    }
}

/// Repository double whose every lookup fails.
#[derive(Debug, Default)]
pub struct FailingRepository;

impl DoorRepository for FailingRepository {
    async fn find_door_by_reader_id(&self, _: &DeviceId) -> StorageResult<Option<DoorAccess>> {
        Err(StorageError::Configuration("database is locked".to_string()))
    }

    async fn find_door_by_keypad_id(&self, _: &DeviceId) -> StorageResult<Option<Door>> {
        Err(StorageError::Configuration("database is locked".to_string()))
    }
}

/// Argon2 verification run inline on the calling task.
///
/// Keeps verification off the blocking pool so paused-clock tests stay
/// deterministic; hashing itself is unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineArgon2;

impl CredentialVerifier for InlineArgon2 {
    async fn verify(&self, stored_hash: &str, candidate: Vec<u8>) -> VerifyOutcome {
        Argon2Verifier::verify_blocking(stored_hash, &candidate)
    }
}

pub fn device(id: &str) -> DeviceId {
    DeviceId::new(id).unwrap()
}

pub fn cheap_hash(password: &str) -> String {
    let params = Params::new(1024, 1, 1, None).unwrap();
    hash_password_with(password.as_bytes(), params).unwrap()
}

/// A door with one active and one inactive card, both using [`PASSWORD`].
pub fn door_access(door: &str, reader: &str, keypad: &str, lock: &str) -> DoorAccess {
    let hash = cheap_hash(PASSWORD);
    DoorAccess::new(
        Door::new(DoorId::new(door).unwrap(), device(reader), device(keypad), device(lock)),
        vec![
            AccessGrant::new(
                GrantId::new(format!("{door}-uk-1")).unwrap(),
                CardCode::new(ACTIVE_CARD).unwrap(),
                true,
                hash.clone(),
            ),
            AccessGrant::new(
                GrantId::new(format!("{door}-uk-2")).unwrap(),
                CardCode::new(INACTIVE_CARD).unwrap(),
                false,
                hash,
            ),
        ],
    )
}

pub fn main_door() -> DoorAccess {
    door_access("door-main", READER, KEYPAD, LOCK)
}

pub fn scan(reader: &str, card: &str) -> CardScanMessage {
    CardScanMessage::new(device(reader), card)
}

pub fn password(keypad: &str, plain: &str) -> KeypadPasswordMessage {
    KeypadPasswordMessage {
        device_id: device(keypad),
        input: STANDARD.encode(plain),
    }
}

pub type TestService = AccessService<Arc<InMemoryDoorRepository>, RecordingBus, InlineArgon2>;

pub fn service_with(config: AccessConfig) -> (TestService, RecordingBus, Arc<InMemoryDoorRepository>) {
    let repo = Arc::new(InMemoryDoorRepository::new().with_door(main_door()));
    let bus = RecordingBus::new();
    let service = AccessService::new(
        Arc::clone(&repo),
        bus.clone(),
        InlineArgon2,
        PublishTopics::default(),
        config,
    )
    .unwrap();
    (service, bus, repo)
}

pub fn service() -> (TestService, RecordingBus, Arc<InMemoryDoorRepository>) {
    service_with(AccessConfig::default())
}
