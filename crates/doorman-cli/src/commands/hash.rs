//! `doorman hash-password`: produce a hash for `user_keycards.password`.

use anyhow::{Context, Result, bail};
use std::io::BufRead;

/// Hash `password`, or the first line of stdin when none is given.
pub fn hash_password(password: Option<String>) -> Result<String> {
    let password = match password {
        Some(password) => password,
        None => read_line(std::io::stdin().lock())?,
    };
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    doorman_access::hash_password(password.as_bytes()).context("Hashing failed")
}

fn read_line(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorman_access::{Argon2Verifier, VerifyOutcome};

    #[test]
    fn test_read_line_strips_newline_only() {
        let line = read_line(" 1234 \r\nignored\n".as_bytes()).unwrap();
        assert_eq!(line, " 1234 ");
    }

    #[test]
    fn test_hash_verifies() {
        let hash = hash_password(Some("4321".to_string())).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(
            Argon2Verifier::verify_blocking(&hash, b"4321"),
            VerifyOutcome::Match
        );
    }

    #[test]
    fn test_empty_password_is_refused() {
        assert!(hash_password(Some(String::new())).is_err());
    }
}
