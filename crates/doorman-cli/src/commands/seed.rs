//! `doorman seed`: load doors and issued cards from a TOML file.
//!
//! ```toml
//! [[doors]]
//! id = "door-main"
//! reader = "515351333120A8470F0F"
//! keypad = "515351333120484E411F"
//! doorlock = "304242375241C9033432"
//!
//! [[cards]]
//! code = "E3:89:6E:AF"
//! holder = "user1"
//! password = "1234"
//! doors = ["door-main"]
//! ```
//!
//! Passwords are hashed before they are stored. Meant for a fresh
//! database: existing doors or card codes make the insert fail.

use anyhow::{Context, Result};
use doorman_core::{CardCode, DeviceId, DoorId, DoorStatus, GrantId};
use doorman_storage::{Door, SqliteDoorRepository};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub doors: Vec<SeedDoor>,
    #[serde(default)]
    pub cards: Vec<SeedCard>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDoor {
    pub id: DoorId,
    pub reader: DeviceId,
    pub keypad: DeviceId,
    pub doorlock: DeviceId,
    #[serde(default = "active")]
    pub status: DoorStatus,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCard {
    pub code: CardCode,
    #[serde(default = "enabled")]
    pub active: bool,
    pub holder: String,
    pub password: String,
    #[serde(default)]
    pub doors: Vec<DoorId>,
}

impl std::fmt::Debug for SeedCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedCard")
            .field("code", &self.code)
            .field("active", &self.active)
            .field("holder", &self.holder)
            .field("doors", &self.doors)
            .finish_non_exhaustive()
    }
}

fn active() -> DoorStatus {
    DoorStatus::Active
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub doors: usize,
    pub cards: usize,
    pub grants: usize,
}

impl SeedFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

pub async fn seed(repository: &SqliteDoorRepository, file: SeedFile) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for door in file.doors {
        let record = Door::new(door.id, door.reader, door.keypad, door.doorlock).with_status(door.status);
        repository
            .insert_door(&record)
            .await
            .with_context(|| format!("Failed to insert door {}", record.id))?;
        info!(door_id = %record.id, status = %record.status, "Door added");
        summary.doors += 1;
    }

    for card in file.cards {
        let keycard_id = repository
            .insert_keycard(&card.code, card.active)
            .await
            .with_context(|| format!("Failed to insert card {}", card.code))?;

        let hash = doorman_access::hash_password(card.password.as_bytes())
            .with_context(|| format!("Failed to hash password for {}", card.holder))?;
        let grant_id = GrantId::new(Uuid::new_v4().to_string())?;
        repository
            .insert_user_keycard(&grant_id, &card.holder, keycard_id, &hash)
            .await
            .with_context(|| format!("Failed to issue card {} to {}", card.code, card.holder))?;
        summary.cards += 1;

        for door_id in &card.doors {
            repository
                .grant_access(&grant_id, door_id)
                .await
                .with_context(|| format!("Failed to grant {} access to {door_id}", card.holder))?;
            summary.grants += 1;
        }

        info!(
            card_code = %card.code.masked(),
            holder = %card.holder,
            active = card.active,
            doors = card.doors.len(),
            "Card issued"
        );
    }

    Ok(summary)
}
