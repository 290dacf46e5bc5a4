pub mod door;
pub mod grant;

pub use door::{Door, DoorAccess};
pub use grant::AccessGrant;
