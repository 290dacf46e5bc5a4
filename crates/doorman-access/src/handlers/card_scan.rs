use crate::bus::Bus;
use crate::credential::CredentialVerifier;
use crate::service::AccessService;
use crate::session::PendingSession;
use crate::status::AccessStatus;
use doorman_protocol::{CardScanMessage, KeypadState};
use doorman_storage::DoorRepository;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What a card scan led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The reader belongs to no known door; nothing was published.
    DoorNotFound,
    /// No active grant for the card; `IncorrectKeycard` was published.
    IncorrectKeycard,
    /// A session is pending; `replaced` if it superseded an earlier one.
    AwaitingPassword { replaced: bool },
}

impl<R, B, V> AccessService<R, B, V>
where
    R: DoorRepository,
    B: Bus,
    V: CredentialVerifier,
{
    pub async fn handle_card_scan(&self, scan: CardScanMessage) -> ScanOutcome {
        let presented = scan.card_code();
        let masked = scan.masked_uid();
        let reader = scan.device_id;
        let inner = &self.inner;

        let access = match inner.repository.find_door_by_reader_id(&reader).await {
            Ok(Some(access)) => access,
            Ok(None) => {
                warn!(device_id = %reader, "Door not found for RFID reader");
                return ScanOutcome::DoorNotFound;
            }
            Err(e) => {
                error!(device_id = %reader, error = %e, "Door lookup by reader failed");
                return ScanOutcome::DoorNotFound;
            }
        };

        let door = &access.door;
        let card = match presented {
            Ok(card) => Some(card),
            Err(e) => {
                debug!(device_id = %reader, card_code = %masked, error = %e, "Malformed card code");
                None
            }
        };
        let Some((card, grant)) = card.and_then(|card| {
            let grant = access.find_active_grant(&card)?;
            Some((card, grant))
        }) else {
            warn!(
                door_id = %door.id,
                device_id = %reader,
                card_code = %masked,
                access_status = %AccessStatus::IncorrectKeycard,
                "Keycard rejected"
            );
            inner
                .publisher
                .keypad_state(&door.keypad_device_id, KeypadState::IncorrectKeycard)
                .await;
            return ScanOutcome::IncorrectKeycard;
        };

        let timeout = inner.config.session_timeout();
        let session = PendingSession {
            door_id: door.id.clone(),
            reader_device_id: reader,
            keypad_device_id: door.keypad_device_id.clone(),
            card_code: card,
            grant_id: grant.id.clone(),
            password_hash: grant.password_hash.clone(),
            expires_at: Instant::now() + timeout,
        };

        let card_code = session.card_code.masked();
        let replaced = inner
            .store
            .put(session, timeout, self.expiry_hook())
            .is_some();

        info!(
            door_id = %door.id,
            card_code = %card_code,
            grant_id = %grant.id,
            replaced,
            timeout_ms = timeout.as_millis() as u64,
            access_status = %AccessStatus::CorrectKeycard,
            "Keycard accepted, awaiting password"
        );

        inner
            .publisher
            .keypad_state(&door.keypad_device_id, KeypadState::AwaitingPassword)
            .await;

        ScanOutcome::AwaitingPassword { replaced }
    }
}
