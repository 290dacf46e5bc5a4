//! [`Bus`] over an MQTT client.

use crate::config::MqttConfig;
use crate::error::Result;
use bytes::Bytes;
use doorman_access::{Bus, BusError};
use doorman_protocol::QoS;
use rumqttc::{AsyncClient, EventLoop};
use tracing::debug;

pub(crate) fn to_mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

/// Publishing handle onto the broker connection.
///
/// Requests are queued to the event loop; nothing reaches the broker
/// unless an [`MqttListener`](crate::MqttListener) is polling it.
#[derive(Debug, Clone)]
pub struct MqttBus {
    client: AsyncClient,
}

impl MqttBus {
    /// Create the client and the event loop that drives it. No network
    /// traffic happens until the event loop is polled.
    pub fn connect(config: &MqttConfig) -> Result<(Self, EventLoop)> {
        let options = config.options()?;
        debug!(host = %config.host, port = config.port, client_id = %config.client_id, "Creating MQTT client");

        let (client, eventloop) = AsyncClient::new(options, config.capacity);
        Ok((Self { client }, eventloop))
    }

    pub fn client(&self) -> &AsyncClient {
        &self.client
    }
}

impl Bus for MqttBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: QoS,
        retain: bool,
    ) -> std::result::Result<(), BusError> {
        self.client
            .publish_bytes(topic, to_mqtt_qos(qos), retain, payload)
            .await
            .map_err(|e| BusError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QoS::AtMostOnce, rumqttc::QoS::AtMostOnce)]
    #[case(QoS::AtLeastOnce, rumqttc::QoS::AtLeastOnce)]
    #[case(QoS::ExactlyOnce, rumqttc::QoS::ExactlyOnce)]
    fn test_qos_mapping(#[case] qos: QoS, #[case] expected: rumqttc::QoS) {
        assert_eq!(to_mqtt_qos(qos), expected);
    }

    #[tokio::test]
    async fn test_publish_is_accepted_before_connect() {
        let (bus, _eventloop) = MqttBus::connect(&MqttConfig::default()).unwrap();

        // Queued for the event loop; nothing is sent until it is polled
        let result = bus
            .publish("keypad/state", Bytes::from_static(b"{}"), QoS::AtLeastOnce, false)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_fails_once_event_loop_is_gone() {
        let (bus, eventloop) = MqttBus::connect(&MqttConfig::default()).unwrap();
        drop(eventloop);

        let result = bus
            .publish("doorlock/open", Bytes::from_static(b"{}"), QoS::AtLeastOnce, false)
            .await;

        assert!(matches!(result, Err(BusError::Publish { topic, .. }) if topic == "doorlock/open"));
    }
}
