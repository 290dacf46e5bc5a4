//! Door access flow for RFID reader, keypad and doorlock devices.
//!
//! A door opens in three steps, each a bus message:
//!
//! 1. A reader reports a card. If the door grants that card, a
//!    [`PendingSession`] is opened and the keypad prompts for a password.
//! 2. The keypad reports a password. If it matches the card holder's
//!    stored hash before the session expires, the keypad shows
//!    `AccessGranted` and the doorlock is told to open.
//! 3. If no correct password arrives in time, the session's timer closes it
//!    and the keypad shows `IncorrectPassword`.
//!
//! A wrong password leaves the session open until it expires, unless an
//! attempt limit is configured.
//!
//! # Per-door state machine
//!
//! ```text
//!            valid scan                 correct password
//!   Idle ─────────────────► Awaiting ─────────────────────► Granted ─► Idle
//!    ▲                      │  ▲  │
//!    │        timeout       │  │  │ wrong password / new valid scan
//!    └──────────────────────┘  └──┘
//! ```
//!
//! All shared state lives in [`SessionStore`]; handlers are otherwise
//! stateless and safe to run concurrently.

pub mod bus;
pub mod config;
pub mod credential;
pub mod error;
pub mod handlers;
pub mod publisher;
pub mod service;
pub mod session;
pub mod shutdown;
pub mod status;

pub use bus::{Bus, BusError};
pub use config::AccessConfig;
pub use credential::{
    Argon2Verifier, CredentialVerifier, VerifyOutcome, hash_password, hash_password_with,
};
pub use error::{AccessError, Result};
pub use handlers::{PasswordOutcome, ScanOutcome};
pub use publisher::{MessagePublisher, PublishTopics};
pub use service::AccessService;
pub use session::{Checkout, OnExpire, PendingSession, SessionStore, Take};
pub use shutdown::ShutdownCoordinator;
pub use status::AccessStatus;
