//! Persistence for doors, keycards and access grants.
//!
//! The access flow only ever reads through [`DoorRepository`]:
//!
//! - by RFID reader id, returning the door with every grant that may open it
//! - by keypad id, returning just the door
//!
//! Two implementations are provided. [`SqliteDoorRepository`] runs over the
//! schema in the workspace `migrations/` directory (tables `doors`,
//! `keycards`, `user_keycards` and `access_grants`). [`InMemoryDoorRepository`]
//! keeps everything in a lock-protected vector for tests and demos.
//!
//! # Example
//!
//! ```no_run
//! use doorman_core::DeviceId;
//! use doorman_storage::{Database, DatabaseConfig, DoorRepository, SqliteDoorRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("doorman.db")).await?;
//! let repo = SqliteDoorRepository::new(db.pool().clone());
//!
//! let reader = DeviceId::new("515351333120A8470F0F")?;
//! if let Some(access) = repo.find_door_by_reader_id(&reader).await? {
//!     println!("door {} has {} grants", access.door.id, access.grants.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AccessGrant, Door, DoorAccess};
pub use repositories::{DoorRepository, InMemoryDoorRepository, SqliteDoorRepository};
