use crate::bus::Bus;
use crate::credential::{CredentialVerifier, VerifyOutcome};
use crate::service::AccessService;
use crate::session::Take;
use crate::status::AccessStatus;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use doorman_protocol::{KeypadPasswordMessage, KeypadState};
use doorman_storage::DoorRepository;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What a password submission led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    /// The keypad belongs to no known door; nothing was published.
    DoorNotFound,
    /// No session was pending for the door.
    NoSession,
    /// The pending session's window had closed.
    Expired,
    /// Wrong, undecodable or unverifiable password. `retry_allowed` is
    /// false when the session ended with this attempt.
    Rejected { retry_allowed: bool },
    /// Correct password: the door was told to unlock.
    Granted,
}

impl<R, B, V> AccessService<R, B, V>
where
    R: DoorRepository,
    B: Bus,
    V: CredentialVerifier,
{
    pub async fn handle_password(&self, entry: KeypadPasswordMessage) -> PasswordOutcome {
        let KeypadPasswordMessage {
            device_id: keypad,
            input,
        } = entry;
        let inner = &self.inner;

        let door = match inner.repository.find_door_by_keypad_id(&keypad).await {
            Ok(Some(door)) => door,
            Ok(None) => {
                warn!(device_id = %keypad, "Door not found for keypad");
                return PasswordOutcome::DoorNotFound;
            }
            Err(e) => {
                error!(device_id = %keypad, error = %e, "Door lookup by keypad failed");
                return PasswordOutcome::DoorNotFound;
            }
        };

        let checkout = match inner.store.take_if_valid(&door.id, Instant::now()) {
            Take::Valid(checkout) => checkout,
            Take::Absent => {
                warn!(
                    door_id = %door.id,
                    device_id = %keypad,
                    access_status = %AccessStatus::IncorrectPassword,
                    "Password entered with no pending session"
                );
                self.reject(&door.keypad_device_id).await;
                return PasswordOutcome::NoSession;
            }
            Take::Expired(session) => {
                warn!(
                    door_id = %door.id,
                    device_id = %keypad,
                    card_code = %session.card_code.masked(),
                    access_status = %AccessStatus::SessionTimeout,
                    "Password entered after session expired"
                );
                self.reject(&door.keypad_device_id).await;
                return PasswordOutcome::Expired;
            }
        };

        // Undecodable input is answered exactly like a wrong password.
        let outcome = match STANDARD.decode(input.as_bytes()) {
            Ok(candidate) => {
                inner
                    .verifier
                    .verify(&checkout.session().password_hash, candidate)
                    .await
            }
            Err(e) => VerifyOutcome::Error(format!("password payload is not base64: {e}")),
        };

        if outcome.is_match() {
            let session = checkout.into_session();
            debug!(door_id = %door.id, access_status = %AccessStatus::CorrectPassword, "Password verified");
            info!(
                door_id = %door.id,
                device_id = %keypad,
                card_code = %session.card_code.masked(),
                grant_id = %session.grant_id,
                access_status = %AccessStatus::AccessGranted,
                "Access granted"
            );
            inner
                .publisher
                .keypad_state(&door.keypad_device_id, KeypadState::AccessGranted)
                .await;
            inner.publisher.unlock(&door.doorlock_device_id).await;
            return PasswordOutcome::Granted;
        }

        if let VerifyOutcome::Error(reason) = &outcome {
            warn!(door_id = %door.id, reason = %reason, "Password could not be verified");
        }

        let attempts = checkout.failed_attempts().saturating_add(1);
        let exhausted = inner
            .config
            .max_password_attempts
            .is_some_and(|max| attempts >= max);

        // Put the session back untouched unless this attempt used up the
        // limit; a newer scan that arrived meanwhile wins over the restore.
        let retry_allowed = if exhausted {
            warn!(door_id = %door.id, attempts, "Password attempt limit reached, session ended");
            false
        } else {
            inner.store.restore(checkout)
        };

        warn!(
            door_id = %door.id,
            device_id = %keypad,
            attempts,
            retry_allowed,
            access_status = %AccessStatus::IncorrectPassword,
            "Incorrect password"
        );
        self.reject(&door.keypad_device_id).await;

        PasswordOutcome::Rejected { retry_allowed }
    }

    async fn reject(&self, keypad: &doorman_core::DeviceId) {
        self.inner
            .publisher
            .keypad_state(keypad, KeypadState::IncorrectPassword)
            .await;
    }
}
