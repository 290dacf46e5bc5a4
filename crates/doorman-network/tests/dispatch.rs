//! Inbound routing from broker publishes into the access flow.
//!
//! The event loop is never polled here: publishes are fed straight into
//! `dispatch` and the access service answers through a recording bus.

use bytes::Bytes;
use doorman_access::{
    AccessConfig, AccessService, Argon2Verifier, Bus, BusError,
};
use doorman_core::{CardCode, DeviceId, DoorId, GrantId};
use doorman_network::{MqttBus, MqttConfig, MqttListener};
use doorman_protocol::{DeviceStatus, KeypadState, KeypadStateMessage, QoS, decode};
use doorman_storage::{AccessGrant, Door, DoorAccess, InMemoryDoorRepository};
use parking_lot::Mutex;
use rstest::rstest;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct RecordingBus {
    published: Arc<Mutex<Vec<(String, Bytes)>>>,
}

impl RecordingBus {
    fn keypad_states(&self) -> Vec<KeypadStateMessage> {
        self.published
            .lock()
            .iter()
            .filter(|(topic, _)| topic == "keypad/state")
            .map(|(_, payload)| decode(payload).unwrap())
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.published.lock().is_empty()
    }
}

impl Bus for RecordingBus {
    async fn publish(&self, topic: &str, payload: Bytes, _: QoS, _: bool) -> Result<(), BusError> {
        self.published.lock().push((topic.to_string(), payload));
        Ok(())
    }
}

type Listener = MqttListener<InMemoryDoorRepository, RecordingBus, Argon2Verifier>;

fn device(id: &str) -> DeviceId {
    DeviceId::new(id).unwrap()
}

fn listener() -> (Listener, RecordingBus) {
    let door = Door::new(
        DoorId::new("door-main").unwrap(),
        device("reader-1"),
        device("keypad-1"),
        device("lock-1"),
    );
    let grant = AccessGrant::new(
        GrantId::new("uk-1").unwrap(),
        CardCode::new("E3:89:6E:AF").unwrap(),
        true,
        "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
    );
    let repo = InMemoryDoorRepository::new().with_door(DoorAccess::new(door, vec![grant]));

    let config = MqttConfig::default();
    let (mqtt, eventloop) = MqttBus::connect(&config).unwrap();
    let bus = RecordingBus::default();
    let service = AccessService::new(
        repo,
        bus.clone(),
        Argon2Verifier::new(),
        config.topics.publish_topics(),
        AccessConfig::default(),
    )
    .unwrap();

    (
        MqttListener::new(mqtt.client().clone(), eventloop, service, &config),
        bus,
    )
}

fn payload(json: &str) -> Bytes {
    Bytes::copy_from_slice(json.as_bytes())
}

#[tokio::test]
async fn test_card_scan_runs_access_flow() {
    let (listener, bus) = listener();

    let handle = listener
        .dispatch(
            "rfid/uid",
            payload(r#"{ "deviceId": "reader-1", "rfidUid": "E3:89:6E:AF" }"#),
        )
        .unwrap();
    handle.await.unwrap();

    let states = bus.keypad_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].device_id.as_str(), "keypad-1");
    assert_eq!(states[0].state, KeypadState::AwaitingPassword);
}

#[tokio::test]
async fn test_unknown_card_is_rejected() {
    let (listener, bus) = listener();

    listener
        .dispatch(
            "rfid/uid",
            payload(r#"{ "deviceId": "reader-1", "rfidUid": "00:00:00:00" }"#),
        )
        .unwrap()
        .await
        .unwrap();

    assert_eq!(bus.keypad_states()[0].state, KeypadState::IncorrectKeycard);
}

#[rstest]
#[case::empty("")]
#[case::spaced("E3 89 6E AF")]
#[case::too_long(&"A".repeat(65))]
#[tokio::test]
async fn test_invalid_card_code_is_rejected_at_known_reader(#[case] uid: &str) {
    let (listener, bus) = listener();
    let json = serde_json::json!({ "deviceId": "reader-1", "rfidUid": uid }).to_string();

    listener
        .dispatch("rfid/uid", payload(&json))
        .unwrap()
        .await
        .unwrap();

    let states = bus.keypad_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].device_id.as_str(), "keypad-1");
    assert_eq!(states[0].state, KeypadState::IncorrectKeycard);
}

#[tokio::test]
async fn test_drain_waits_for_in_flight_scans() {
    let (mut listener, bus) = listener();

    let pending = listener.dispatch(
        "rfid/uid",
        payload(r#"{ "deviceId": "reader-1", "rfidUid": "E3:89:6E:AF" }"#),
    );
    assert!(pending.is_some());

    listener.drain().await;

    assert_eq!(listener.in_flight(), 0);
    assert_eq!(listener.service().store().len(), 1);
    assert_eq!(listener.service().store().clear_all(), 1);
    assert!(listener.service().store().is_empty());
    assert_eq!(bus.keypad_states()[0].state, KeypadState::AwaitingPassword);
}

#[tokio::test]
async fn test_password_without_session_is_rejected() {
    let (listener, bus) = listener();

    listener
        .dispatch(
            "keypad/key",
            payload(r#"{ "deviceId": "keypad-1", "input": "MTIzNA==" }"#),
        )
        .unwrap()
        .await
        .unwrap();

    let states = bus.keypad_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].state, KeypadState::IncorrectPassword);
}

#[tokio::test]
async fn test_malformed_payloads_are_dropped() {
    let (listener, bus) = listener();

    let bad = [
        ("rfid/uid", "not json"),
        ("rfid/uid", r#"{ "deviceId": "reader-1" }"#),
        ("rfid/uid", r#"{ "deviceId": "", "rfidUid": "E3:89:6E:AF" }"#),
        ("keypad/key", r#"{ "input": "MTIzNA==" }"#),
        ("keypad/key", ""),
        ("device-status", r#"{ "deviceId": "reader-1", "status": "sleeping" }"#),
    ];
    for (topic, json) in bad {
        assert!(listener.dispatch(topic, payload(json)).is_none(), "{topic}: {json}");
    }

    assert!(bus.is_empty());
    assert_eq!(listener.in_flight(), 0);
}

#[tokio::test]
async fn test_unrouted_topics_are_ignored() {
    let (listener, bus) = listener();

    let echoed = payload(r#"{ "deviceId": "keypad-1", "state": "AwaitingPassword", "time": 8000 }"#);
    assert!(listener.dispatch("keypad/state", echoed).is_none());
    assert!(listener.dispatch("sensors/temperature", payload("{}")).is_none());

    assert!(bus.is_empty());
}

#[tokio::test]
async fn test_device_status_is_recorded() {
    let (listener, bus) = listener();

    listener.dispatch(
        "device-status",
        payload(r#"{ "deviceId": "reader-1", "status": "online" }"#),
    );
    listener.dispatch(
        "device-status",
        payload(r#"{ "deviceId": "Backend", "status": "online" }"#),
    );

    let registry = listener.registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.get(&device("reader-1")).map(|r| r.status),
        Some(DeviceStatus::Online)
    );
    assert!(bus.is_empty());
}
