//! Password hashing with Argon2id, stored as PHC strings.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use model::entities::user::UNUSABLE_PASSWORD_PREFIX;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{trace, warn};

use crate::error::{AuthError, Result};

/// Hash `raw` with a fresh random salt.
pub fn make_password(raw: &str) -> Result<String> {
    trace!("Hashing password");
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let hash = Argon2::default().hash_password(raw.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `raw` against an encoded hash. Unusable and malformed hashes never match.
pub fn check_password(raw: &str, encoded: &str) -> bool {
    if !is_password_usable(encoded) {
        return false;
    }

    match PasswordHash::new(encoded) {
        Ok(parsed) => Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

pub fn is_password_usable(encoded: &str) -> bool {
    !encoded.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// A value for the password column that no input can ever match.
pub fn make_unusable_password() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    format!("{UNUSABLE_PASSWORD_PREFIX}{suffix}")
}

/// [`make_password`] on the blocking thread pool, keeping async workers free.
pub async fn spawn_make_password(raw: &str) -> Result<String> {
    let raw = raw.to_string();
    tokio::task::spawn_blocking(move || make_password(&raw))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// [`check_password`] on the blocking thread pool. A failed task never matches.
pub async fn spawn_check_password(raw: &str, encoded: &str) -> bool {
    let (raw, encoded) = (raw.to_string(), encoded.to_string());
    match tokio::task::spawn_blocking(move || check_password(&raw, &encoded)).await {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Password check task failed: {}", e);
            false
        }
    }
}

/// Spend one hash computation on `raw` and discard the result.
///
/// Called when a login names an unknown user so that the response time does
/// not reveal whether the username exists.
pub async fn burn_hash(raw: &str) {
    if let Err(e) = spawn_make_password(raw).await {
        warn!("Dummy password hash failed: {}", e);
    }
}
