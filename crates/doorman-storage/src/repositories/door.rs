use crate::error::{StorageError, StorageResult};
use crate::models::{AccessGrant, Door, DoorAccess};
use doorman_core::{CardCode, DeviceId, DoorId, DoorStatus, GrantId};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Resolves doors from the device ids carried by inbound events.
///
/// The returned futures are `Send` so lookups can run inside spawned
/// handler tasks.
pub trait DoorRepository: Send + Sync {
    /// Door operated by the given RFID reader, with all of its grants.
    fn find_door_by_reader_id(
        &self,
        reader_id: &DeviceId,
    ) -> impl Future<Output = StorageResult<Option<DoorAccess>>> + Send;

    /// Door operated by the given keypad.
    fn find_door_by_keypad_id(
        &self,
        keypad_id: &DeviceId,
    ) -> impl Future<Output = StorageResult<Option<Door>>> + Send;
}

impl<R: DoorRepository> DoorRepository for Arc<R> {
    fn find_door_by_reader_id(
        &self,
        reader_id: &DeviceId,
    ) -> impl Future<Output = StorageResult<Option<DoorAccess>>> + Send {
        (**self).find_door_by_reader_id(reader_id)
    }

    fn find_door_by_keypad_id(
        &self,
        keypad_id: &DeviceId,
    ) -> impl Future<Output = StorageResult<Option<Door>>> + Send {
        (**self).find_door_by_keypad_id(keypad_id)
    }
}

#[derive(sqlx::FromRow)]
struct DoorRow {
    id: String,
    rfid_device_id: String,
    keypad_device_id: String,
    doorlock_device_id: String,
    status: String,
}

impl TryFrom<DoorRow> for Door {
    type Error = StorageError;

    fn try_from(row: DoorRow) -> StorageResult<Self> {
        let invalid = |e| StorageError::invalid_row("doors", e);
        Ok(Door {
            id: DoorId::new(row.id).map_err(invalid)?,
            reader_device_id: DeviceId::new(row.rfid_device_id).map_err(invalid)?,
            keypad_device_id: DeviceId::new(row.keypad_device_id).map_err(invalid)?,
            doorlock_device_id: DeviceId::new(row.doorlock_device_id).map_err(invalid)?,
            status: DoorStatus::parse(&row.status).map_err(invalid)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GrantRow {
    user_keycard_id: String,
    code: String,
    active: bool,
    password: String,
}

impl TryFrom<GrantRow> for AccessGrant {
    type Error = StorageError;

    fn try_from(row: GrantRow) -> StorageResult<Self> {
        let invalid = |e| StorageError::invalid_row("user_keycards", e);
        Ok(AccessGrant::new(
            GrantId::new(row.user_keycard_id).map_err(invalid)?,
            CardCode::new(row.code).map_err(invalid)?,
            row.active,
            row.password,
        ))
    }
}

/// SQLite implementation of [`DoorRepository`].
///
/// Also exposes the inserts needed to provision doors, cards and grants.
#[derive(Debug, Clone)]
pub struct SqliteDoorRepository {
    pool: SqlitePool,
}

impl SqliteDoorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn grants_for(&self, door_id: &DoorId) -> StorageResult<Vec<AccessGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT uk.id AS user_keycard_id, k.code AS code,
                   k.active AS active, uk.password AS password
            FROM access_grants g
            JOIN user_keycards uk ON uk.id = g.user_keycard_id
            JOIN keycards k ON k.id = uk.keycard_id
            WHERE g.door_id = ?
            ORDER BY g.created_at, uk.id
            "#,
        )
        .bind(door_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let grants = rows
            .into_iter()
            .filter_map(|row| match AccessGrant::try_from(row) {
                Ok(grant) => Some(grant),
                Err(e) => {
                    warn!(door_id = %door_id, error = %e, "Skipping unreadable access grant");
                    None
                }
            })
            .collect();

        Ok(grants)
    }

    pub async fn insert_door(&self, door: &Door) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO doors (id, rfid_device_id, keypad_device_id, doorlock_device_id, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(door.id.as_str())
        .bind(door.reader_device_id.as_str())
        .bind(door.keypad_device_id.as_str())
        .bind(door.doorlock_device_id.as_str())
        .bind(door.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register a physical card, returning its row id.
    pub async fn insert_keycard(&self, code: &CardCode, active: bool) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO keycards (code, active) VALUES (?, ?)")
            .bind(code.as_str())
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn set_keycard_active(&self, code: &CardCode, active: bool) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE keycards SET active = ? WHERE code = ?")
            .bind(active)
            .bind(code.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Issue a card to a holder with the holder's password hash.
    pub async fn insert_user_keycard(
        &self,
        id: &GrantId,
        user_id: &str,
        keycard_id: i64,
        password_hash: &str,
    ) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO user_keycards (id, user_id, keycard_id, password) VALUES (?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(user_id)
        .bind(keycard_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Allow an issued card through a door. Granting twice is a no-op.
    pub async fn grant_access(&self, user_keycard_id: &GrantId, door_id: &DoorId) -> StorageResult<()> {
        sqlx::query("INSERT OR IGNORE INTO access_grants (user_keycard_id, door_id) VALUES (?, ?)")
            .bind(user_keycard_id.as_str())
            .bind(door_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl DoorRepository for SqliteDoorRepository {
    async fn find_door_by_reader_id(&self, reader_id: &DeviceId) -> StorageResult<Option<DoorAccess>> {
        let row = sqlx::query_as::<_, DoorRow>(
            r#"
            SELECT id, rfid_device_id, keypad_device_id, doorlock_device_id, status
            FROM doors
            WHERE rfid_device_id = ?
            "#,
        )
        .bind(reader_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let door = Door::try_from(row)?;
        let grants = self.grants_for(&door.id).await?;
        Ok(Some(DoorAccess::new(door, grants)))
    }

    async fn find_door_by_keypad_id(&self, keypad_id: &DeviceId) -> StorageResult<Option<Door>> {
        let row = sqlx::query_as::<_, DoorRow>(
            r#"
            SELECT id, rfid_device_id, keypad_device_id, doorlock_device_id, status
            FROM doors
            WHERE keypad_device_id = ?
            "#,
        )
        .bind(keypad_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Door::try_from).transpose()
    }
}
