//! Inbound event handlers.
//!
//! Each handler resolves the door from the device id on the event, touches
//! the session store once, and publishes the resulting keypad state. They
//! never fail: repository and bus errors are logged and mapped onto the
//! same outcomes a device would otherwise see.

mod card_scan;
mod password;

pub use card_scan::ScanOutcome;
pub use password::PasswordOutcome;
