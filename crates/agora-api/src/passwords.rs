use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hashing and verification of account passwords.
pub trait PasswordScheme: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// `Ok(false)` on a wrong password; `Err` only when `stored_hash` is
    /// unreadable.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool>;

    /// A hash with the same cost as real ones, verified against when the
    /// username is unknown so both login failures do the same work.
    fn dummy_hash(&self) -> &str;
}

/// Argon2id with the crate's default cost parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Scheme;

static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_with_random_salt("agora-unknown-user").unwrap_or_default()
});

fn hash_with_random_salt(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string())
}

impl PasswordScheme for Argon2Scheme {
    fn hash(&self, password: &str) -> Result<String> {
        hash_with_random_salt(password)
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| anyhow!("unreadable password hash: {}", e))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    }

    fn dummy_hash(&self) -> &str {
        &DUMMY_HASH
    }
}
