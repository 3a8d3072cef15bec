//! Password hashing and policy for the self-hosted identity providers (memory, local).
//!
//! Uses argon2id; hashes are PHC strings carrying their own salt and parameters.

use crate::domain::{AuthFailure, DomainError};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

/// Same minimum the managed provider enforces.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hashing cost profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCost {
    /// argon2 recommended defaults.
    Standard,
    /// Minimal memory/iterations. In-process backend only, where hashes never leave memory.
    Light,
}

fn argon2(cost: HashCost) -> Argon2<'static> {
    match cost {
        HashCost::Standard => Argon2::default(),
        HashCost::Light => {
            let params = Params::new(1024, 1, 1, None).unwrap_or_default();
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        }
    }
}

/// Reject passwords below the provider minimum.
pub fn check_policy(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthFailure::WeakPassword {
            min_len: MIN_PASSWORD_LEN,
        }
        .into());
    }
    Ok(())
}

pub fn hash_password(password: &str, cost: HashCost) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2(cost)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthFailure::Provider(format!("failed to hash password: {e}")).into())
}

/// Parameters are read from the PHC string, so either cost profile verifies.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, DomainError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthFailure::Provider(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
