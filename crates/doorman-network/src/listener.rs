//! The inbound side: drives the MQTT event loop and feeds the access flow.

use crate::config::{MqttConfig, backend_status};
use crate::registry::DeviceRegistry;
use crate::topics::{Inbound, MqttTopics};
use bytes::Bytes;
use chrono::Utc;
use doorman_access::{AccessService, Bus, CredentialVerifier};
use doorman_core::constants::BACKEND_DEVICE_ID;
use doorman_protocol::{
    CardScanMessage, DeviceStatus, DeviceStatusMessage, KeypadPasswordMessage, decode,
};
use doorman_storage::DoorRepository;
use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, QoS};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

/// How long shutdown waits for in-flight handlers.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// How long shutdown waits for the broker to take the disconnect.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Polls the broker connection and hands every decoded card scan and
/// password to the access service on its own task.
///
/// The event loop reconnects by itself on the next poll; after a
/// connection error the listener only waits `retry_delay` before polling
/// again. Subscriptions and the backend's online status are renewed on
/// every connect.
pub struct MqttListener<R, B, V> {
    client: AsyncClient,
    eventloop: EventLoop,
    service: AccessService<R, B, V>,
    registry: DeviceRegistry,
    topics: MqttTopics,
    retry_delay: Duration,
    tasks: TaskTracker,
}

impl<R, B, V> MqttListener<R, B, V>
where
    R: DoorRepository + 'static,
    B: Bus,
    V: CredentialVerifier,
{
    pub fn new(
        client: AsyncClient,
        eventloop: EventLoop,
        service: AccessService<R, B, V>,
        config: &MqttConfig,
    ) -> Self {
        Self {
            client,
            eventloop,
            service,
            registry: DeviceRegistry::new(),
            topics: config.topics.clone(),
            retry_delay: config.retry_delay(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn service(&self) -> &AccessService<R, B, V> {
        &self.service
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Handler tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Poll until `token` is cancelled.
    pub async fn run(&mut self, token: CancellationToken) {
        info!(subscriptions = ?self.topics.subscriptions(), "MQTT listener started");

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = self.eventloop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(session_present = ack.session_present, "Connected to MQTT broker");
                    self.on_connected();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.dispatch(&publish.topic, publish.payload);
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    debug!(pkid = ack.pkid, "Subscription acknowledged");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(
                        error = %e,
                        retry_in_ms = self.retry_delay.as_millis() as u64,
                        "MQTT connection error"
                    );
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("MQTT listener stopped");
    }

    /// Route one inbound publish. Card scans and passwords are handled on
    /// a spawned task whose handle is returned; status messages are
    /// recorded inline. Undecodable payloads are logged and dropped.
    pub fn dispatch(&self, topic: &str, payload: Bytes) -> Option<JoinHandle<()>> {
        let Some(inbound) = self.topics.route(topic) else {
            trace!(topic, "Ignoring publish on unrouted topic");
            return None;
        };

        match inbound {
            Inbound::CardScan => match decode::<CardScanMessage>(&payload) {
                Ok(scan) => {
                    debug!(
                        device_id = %scan.device_id,
                        card_code = %scan.masked_uid(),
                        "Card scan received"
                    );
                    let service = self.service.clone();
                    Some(self.tasks.spawn(async move {
                        service.handle_card_scan(scan).await;
                    }))
                }
                Err(e) => {
                    warn!(topic, error = %e, "Dropping undecodable card scan");
                    None
                }
            },
            Inbound::Password => match decode::<KeypadPasswordMessage>(&payload) {
                Ok(entry) => {
                    debug!(device_id = %entry.device_id, "Keypad password received");
                    let service = self.service.clone();
                    Some(self.tasks.spawn(async move {
                        service.handle_password(entry).await;
                    }))
                }
                Err(e) => {
                    warn!(topic, error = %e, "Dropping undecodable keypad password");
                    None
                }
            },
            Inbound::DeviceStatus => {
                match decode::<DeviceStatusMessage>(&payload) {
                    Ok(message) => self.record_status(&message),
                    Err(e) => warn!(topic, error = %e, "Dropping undecodable device status"),
                }
                None
            }
        }
    }

    fn record_status(&self, message: &DeviceStatusMessage) {
        if message.device_id.as_str() == BACKEND_DEVICE_ID {
            trace!(status = %message.status, "Own status echoed back");
            return;
        }

        let previous = self.registry.record(message, Utc::now());
        info!(
            device_id = %message.device_id,
            status = %message.status,
            previous = ?previous,
            "Device status"
        );
    }

    /// Called from inside the poll loop, so requests must not wait for
    /// channel capacity.
    fn on_connected(&self) {
        for topic in self.topics.subscriptions() {
            match self.client.try_subscribe(topic, QoS::AtLeastOnce) {
                Ok(()) => info!(topic, "Subscribing"),
                Err(e) => error!(topic, error = %e, "Subscribe request failed"),
            }
        }
        self.announce(DeviceStatus::Online);
    }

    fn announce(&self, status: DeviceStatus) {
        let payload = match backend_status(status) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to encode backend status");
                return;
            }
        };

        match self
            .client
            .try_publish(&self.topics.status, QoS::AtLeastOnce, true, payload.to_vec())
        {
            Ok(()) => info!(status = %status, topic = %self.topics.status, "Backend status published"),
            Err(e) => error!(status = %status, error = %e, "Failed to publish backend status"),
        }
    }

    /// Stop accepting handlers and wait for the in-flight ones, polling
    /// the event loop meanwhile. Call after [`run`](Self::run) has
    /// returned; clear sessions only once this is done, since a scan still
    /// in flight arms a fresh timer.
    pub async fn drain(&mut self) {
        self.tasks.close();

        // Handlers publish through the event loop, so keep polling it
        let tasks = self.tasks.clone();
        let eventloop = &mut self.eventloop;
        let drain = async {
            loop {
                tokio::select! {
                    _ = tasks.wait() => break,
                    event = eventloop.poll() => {
                        if event.is_err() {
                            tasks.wait().await;
                            break;
                        }
                    }
                }
            }
        };
        if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
            warn!(in_flight = self.tasks.len(), "Handlers still running at shutdown");
        }
    }

    /// Announce the backend offline and close the connection.
    pub async fn disconnect(&mut self) {
        self.announce(DeviceStatus::Offline);
        if let Err(e) = self.client.try_disconnect() {
            warn!(error = %e, "Disconnect request failed");
            return;
        }

        let eventloop = &mut self.eventloop;
        let flush = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        match tokio::time::timeout(DISCONNECT_GRACE, flush).await {
            Ok(()) => info!("Disconnected from MQTT broker"),
            Err(_) => warn!("Timed out waiting for MQTT disconnect"),
        }
    }
}
