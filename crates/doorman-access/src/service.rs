use crate::bus::Bus;
use crate::config::AccessConfig;
use crate::credential::{Argon2Verifier, CredentialVerifier};
use crate::error::Result;
use crate::publisher::{MessagePublisher, PublishTopics};
use crate::session::{OnExpire, PendingSession, SessionStore};
use crate::status::AccessStatus;
use doorman_protocol::KeypadState;
use doorman_storage::DoorRepository;
use std::sync::Arc;
use tracing::warn;

pub(crate) struct ServiceInner<R, B, V> {
    pub(crate) repository: R,
    pub(crate) verifier: V,
    pub(crate) publisher: Arc<MessagePublisher<B>>,
    pub(crate) store: SessionStore,
    pub(crate) config: AccessConfig,
}

/// The door access flow: card scan, then keypad password, then unlock.
///
/// Cheap to clone; clones share the session store, so each inbound event
/// can be handled on its own task.
pub struct AccessService<R, B, V = Argon2Verifier> {
    pub(crate) inner: Arc<ServiceInner<R, B, V>>,
}

impl<R, B, V> Clone for AccessService<R, B, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, B, V> AccessService<R, B, V>
where
    R: DoorRepository,
    B: Bus,
    V: CredentialVerifier,
{
    pub fn new(
        repository: R,
        bus: B,
        verifier: V,
        topics: PublishTopics,
        config: AccessConfig,
    ) -> Result<Self> {
        Self::with_store(repository, bus, verifier, topics, config, SessionStore::new())
    }

    /// Build over an existing store, e.g. one shared with a shutdown hook.
    pub fn with_store(
        repository: R,
        bus: B,
        verifier: V,
        topics: PublishTopics,
        config: AccessConfig,
        store: SessionStore,
    ) -> Result<Self> {
        config.validate()?;
        let publisher = Arc::new(MessagePublisher::new(bus, topics, config.clone()));

        Ok(Self {
            inner: Arc::new(ServiceInner {
                repository,
                verifier,
                publisher,
                store,
                config,
            }),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn config(&self) -> &AccessConfig {
        &self.inner.config
    }

    pub fn publisher(&self) -> &MessagePublisher<B> {
        &self.inner.publisher
    }

    /// Timer callback: the store has already removed the session, so all
    /// that is left is telling the keypad the window closed.
    pub(crate) fn expiry_hook(&self) -> OnExpire {
        let publisher = Arc::clone(&self.inner.publisher);

        Arc::new(move |session: PendingSession| {
            let publisher = Arc::clone(&publisher);
            Box::pin(async move {
                warn!(
                    door_id = %session.door_id,
                    device_id = %session.keypad_device_id,
                    card_code = %session.card_code.masked(),
                    access_status = %AccessStatus::SessionTimeout,
                    "Session timed out waiting for password"
                );
                publisher
                    .keypad_state(&session.keypad_device_id, KeypadState::IncorrectPassword)
                    .await;
            })
        })
    }
}
