//! One-time confirmation codes: generation and hash verification.

use anyhow::anyhow;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;

use crate::error::AuthError;

/// Draw a fresh 6-digit confirmation code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Hash a code for persistence. The plaintext is only held long enough to
/// hand to the notification gateway.
pub fn hash_code(code: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| AuthError::Storage(anyhow!("Failed to hash confirmation code: {e}")))?;
    Ok(hash.to_string())
}

/// Check a submitted code against a stored hash. A malformed stored hash
/// counts as a mismatch.
pub fn verify_code(code: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(code.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
