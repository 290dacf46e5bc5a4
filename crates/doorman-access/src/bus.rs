//! The message bus seam.
//!
//! Handlers publish through [`Bus`]; the MQTT client implements it in
//! production and tests substitute a recorder.

use bytes::Bytes;
use doorman_protocol::{ProtocolError, QoS};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Bus is disconnected")]
    Disconnected,

    #[error("Publish to {topic} failed: {message}")]
    Publish { topic: String, message: String },

    #[error("Payload encoding failed: {0}")]
    Encode(#[from] ProtocolError),
}

/// Outbound side of a pub/sub transport.
pub trait Bus: Send + Sync + 'static {
    /// Hand a payload to the transport. Completion means the transport
    /// accepted it, not that any subscriber received it.
    fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BusError>> + Send;
}

impl<B: Bus> Bus for Arc<B> {
    fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BusError>> + Send {
        (**self).publish(topic, payload, qos, retain)
    }
}
