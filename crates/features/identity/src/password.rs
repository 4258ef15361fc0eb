//! Argon2id hashing and the password policy.

use crate::error::IdentityError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use std::sync::LazyLock;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
const SALT_BYTES: usize = 16;

/// Hash compared against when the account does not exist, so that unknown and known
/// e-mails take the same time to reject.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_blocking("cardly-dummy-password-1").ok());

/// Checks length and character classes; the message is safe to show to users.
pub fn validate_policy(password: &str) -> Result<(), IdentityError> {
    let len = password.chars().count();
    let problem = if len < MIN_PASSWORD_LEN {
        Some("password must be at least 8 characters")
    } else if len > MAX_PASSWORD_LEN {
        Some("password must be at most 128 characters")
    } else if !password.chars().any(char::is_alphabetic) {
        Some("password must contain a letter")
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some("password must contain a digit")
    } else {
        None
    };

    match problem {
        Some(message) => Err(IdentityError::Validation { message: message.into(), context: None }),
        None => Ok(()),
    }
}

fn hash_blocking(password: &str) -> Result<String, IdentityError> {
    let mut salt = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|err| IdentityError::Hash { message: err.to_string().into(), context: None })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| IdentityError::Hash { message: err.to_string().into(), context: None })
}

fn verify_blocking(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Hashes on the blocking pool; Argon2 is deliberately slow.
pub async fn hash(password: String) -> Result<String, IdentityError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|err| IdentityError::Internal { message: err.to_string().into(), context: None })?
}

/// Verifies against `hash`, or against a dummy hash when there is no account.
pub async fn verify(password: String, hash: Option<String>) -> Result<bool, IdentityError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_blocking(&password, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_blocking(&password, dummy);
            }
            false
        }
    })
    .await
    .map_err(|err| IdentityError::Internal { message: err.to_string().into(), context: None })
}
