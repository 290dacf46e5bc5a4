//! Password verification against stored argon2 hashes.

use crate::error::{AccessError, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier};
use std::future::Future;
use tracing::warn;

/// Result of checking a candidate against a stored hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Match,
    Mismatch,
    /// The hash could not be parsed or the primitive failed.
    Error(String),
}

impl VerifyOutcome {
    /// Fail-closed view: only an explicit match counts.
    pub fn is_match(&self) -> bool {
        matches!(self, VerifyOutcome::Match)
    }
}

/// Checks a plaintext candidate against a stored password hash.
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify(
        &self,
        stored_hash: &str,
        candidate: Vec<u8>,
    ) -> impl Future<Output = VerifyOutcome> + Send;
}

/// Argon2 verifier. Parameters are read from each PHC hash string, so
/// hashes produced with different costs verify side by side.
///
/// Hashing is CPU and memory bound; it runs on the blocking pool so one
/// door's verification never stalls event handling for others.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl Argon2Verifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous check, for callers already off the async runtime.
    pub fn verify_blocking(stored_hash: &str, candidate: &[u8]) -> VerifyOutcome {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(hash) => hash,
            Err(e) => return VerifyOutcome::Error(format!("unparseable hash: {e}")),
        };

        match Argon2::default().verify_password(candidate, &parsed) {
            Ok(()) => VerifyOutcome::Match,
            Err(argon2::password_hash::Error::Password) => VerifyOutcome::Mismatch,
            Err(e) => VerifyOutcome::Error(e.to_string()),
        }
    }
}

impl CredentialVerifier for Argon2Verifier {
    async fn verify(&self, stored_hash: &str, candidate: Vec<u8>) -> VerifyOutcome {
        let stored_hash = stored_hash.to_owned();
        let task = tokio::task::spawn_blocking(move || Self::verify_blocking(&stored_hash, &candidate));

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Password verification task failed");
                VerifyOutcome::Error(e.to_string())
            }
        }
    }
}

/// Hash a password with argon2id and the library's default cost.
pub fn hash_password(password: &[u8]) -> Result<String> {
    hash_password_with(password, Params::default())
}

/// Hash a password with explicit argon2id cost parameters.
pub fn hash_password_with(password: &[u8], params: Params) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    argon2
        .hash_password(password, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccessError::Hashing(e.to_string()))
}
