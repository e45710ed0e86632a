use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref DUMMY_HASH: Option<String> = hash_password("no-such-account").ok();
}

/// A real argon2 hash that no account uses.
pub fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH.as_deref()
}

/// Spends one verification against [`dummy_hash`] and discards the result.
pub fn burn_verify(plain: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(plain, hash);
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored PHC hash string.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Returns every rule `password` breaks; empty when it is acceptable.
pub fn policy_violations(password: &str) -> Vec<&'static str> {
    let mut broken = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        broken.push("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        broken.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        broken.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        broken.push("Password must contain at least one number");
    }
    broken
}
