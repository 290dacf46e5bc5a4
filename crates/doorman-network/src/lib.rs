//! MQTT transport for the doorman access flow.
//!
//! [`MqttBus`] publishes keypad states and unlock commands; [`MqttListener`]
//! polls the broker connection, decodes inbound card scans and passwords,
//! and runs each one through the [`AccessService`](doorman_access::AccessService)
//! on its own task.
//!
//! ```text
//! broker ──poll──► MqttListener ──spawn──► AccessService ──► MqttBus ──► broker
//!                      │
//!                      └── device-status ──► DeviceRegistry
//! ```
//!
//! # Example
//!
//! ```no_run
//! use doorman_access::{AccessConfig, AccessService, Argon2Verifier};
//! use doorman_network::{MqttBus, MqttConfig, MqttListener};
//! use doorman_storage::InMemoryDoorRepository;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MqttConfig::default().with_broker_url("mqtt://localhost:1883")?;
//! let (bus, eventloop) = MqttBus::connect(&config)?;
//!
//! let service = AccessService::new(
//!     InMemoryDoorRepository::new(),
//!     bus.clone(),
//!     Argon2Verifier::new(),
//!     config.topics.publish_topics(),
//!     AccessConfig::default(),
//! )?;
//!
//! let mut listener = MqttListener::new(bus.client().clone(), eventloop, service, &config);
//! listener.run(CancellationToken::new()).await;
//! listener.drain().await;
//! listener.service().store().clear_all();
//! listener.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod bus;
mod config;
mod error;
mod listener;
mod registry;
mod topics;

pub use bus::MqttBus;
pub use config::{DEFAULT_MQTT_PORT, MqttConfig, backend_status, parse_broker_url};
pub use error::{NetworkError, Result};
pub use listener::MqttListener;
pub use registry::{DeviceRecord, DeviceRegistry};
pub use topics::{Inbound, MqttTopics};
