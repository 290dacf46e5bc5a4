pub mod door;
pub mod memory;

pub use door::{DoorRepository, SqliteDoorRepository};
pub use memory::InMemoryDoorRepository;
