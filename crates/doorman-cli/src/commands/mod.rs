mod hash;
mod migrate;
mod run;
mod seed;

pub use hash::hash_password;
pub use migrate::migrate;
pub use run::run;
pub use seed::{SeedFile, SeedSummary, seed};
