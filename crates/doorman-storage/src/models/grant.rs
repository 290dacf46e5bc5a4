use doorman_core::{CardCode, GrantId};
use std::fmt;

/// One holder's permission to open a door: the card they present and the
/// password hash their keypad entry is checked against.
///
/// `id` identifies the issued card (holder plus physical card), so two
/// holders sharing a physical card still carry separate passwords.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub id: GrantId,
    pub card_code: CardCode,
    pub card_active: bool,
    /// Argon2 hash in PHC string format.
    pub password_hash: String,
}

impl AccessGrant {
    pub fn new(
        id: GrantId,
        card_code: CardCode,
        card_active: bool,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            card_code,
            card_active,
            password_hash: password_hash.into(),
        }
    }

    pub fn admits(&self, code: &CardCode) -> bool {
        self.card_active && self.card_code == *code
    }
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("id", &self.id)
            .field("card_code", &self.card_code)
            .field("card_active", &self.card_active)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
