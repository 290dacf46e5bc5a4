//! JSON encoding of bus payloads.
//!
//! Outbound payloads are pretty-printed, matching what deployed device
//! firmware already parses; inbound payloads accept any valid JSON layout.

use crate::error::{ProtocolError, Result};
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serialize a payload for publishing.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes> {
    let json = serde_json::to_vec_pretty(message)?;
    Ok(Bytes::from(json))
}

/// Decode an inbound payload.
///
/// Identifier fields are validated during deserialization, so a payload
/// with an empty device id or card code fails here rather than in a handler.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(ProtocolError::EmptyPayload);
    }

    serde_json::from_slice(payload).map_err(ProtocolError::from)
}
