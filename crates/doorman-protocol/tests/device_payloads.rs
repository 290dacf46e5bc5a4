//! Decoding payloads exactly as the device firmware formats them.

use doorman_protocol::{
    CardScanMessage, DeviceStatus, DeviceStatusMessage, DoorlockUnlockMessage, KeypadPasswordMessage,
    KeypadState, KeypadStateMessage, decode, encode,
};
use doorman_core::DeviceId;

const READER_SCAN: &str = "{\n  \"deviceId\": \"515351333120A8470F0F\",\n  \"rfidUid\": \"E3:89:6E:AF\"\n}";
const KEYPAD_INPUT: &str = "{\n  \"deviceId\": \"304242375241C9033432\",\n  \"input\": \"MTIzNA==\"\n}";
const KEYPAD_ONLINE: &str = "{\"deviceId\": \"304242375241C9033432\", \"status\": \"online\"}";

#[test]
fn test_reader_scan_payload() {
    let msg: CardScanMessage = decode(READER_SCAN.as_bytes()).unwrap();

    assert_eq!(msg.device_id.as_str(), "515351333120A8470F0F");
    assert_eq!(msg.masked_uid(), "*******E:AF");
}

#[test]
fn test_keypad_input_payload() {
    let msg: KeypadPasswordMessage = decode(KEYPAD_INPUT.as_bytes()).unwrap();

    assert_eq!(msg.device_id.as_str(), "304242375241C9033432");
    assert_eq!(msg.input, "MTIzNA==");
}

#[test]
fn test_keypad_status_payload() {
    let msg: DeviceStatusMessage = decode(KEYPAD_ONLINE.as_bytes()).unwrap();

    assert_eq!(msg.status, DeviceStatus::Online);
}

#[test]
fn test_outbound_payloads_are_readable_by_keypad() {
    let keypad = DeviceId::new("304242375241C9033432").unwrap();
    let state = KeypadStateMessage::new(keypad, KeypadState::AccessGranted, 5000);

    let bytes = encode(&state).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(value["deviceId"], "304242375241C9033432");
    assert_eq!(value["state"], "AccessGranted");
    assert_eq!(value["time"], 5000);
}

#[test]
fn test_unlock_payload() {
    let lock = DeviceId::new("4C4F434B30303031").unwrap();
    let bytes = encode(&DoorlockUnlockMessage::new(lock, 10000)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(value["deviceId"], "4C4F434B30303031");
    assert_eq!(value["time"], 10000);
}
