//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so parameters travel with each hash and
//! verification keeps working if the cost settings change later.
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
}

/// Argon2id cost used in production: 19 MiB, 2 passes, 1 lane.
pub const DEFAULT_M_COST: u32 = 19 * 1024;
pub const DEFAULT_T_COST: u32 = 2;
pub const DEFAULT_P_COST: u32 = 1;

/// Input for the unknown-user path of login. Never a real credential.
const DUMMY_PASSWORD: &str = "not-a-real-password";

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // same params as real hashes, so verifying against it costs the same
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub fn new() -> Result<Self, PasswordError> {
        Self::with_params(DEFAULT_M_COST, DEFAULT_T_COST, DEFAULT_P_COST)
    }

    /// Argon2id with explicit cost (memory in KiB, iterations, lanes).
    ///
    /// Hashes the dummy password up front, so the first unknown-user login
    /// is not slower than later ones.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(PasswordError::Params)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;

        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Cheap parameters so tests don't spend seconds per hash in debug builds.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::with_params(1024, 1, 1).expect("valid test params")
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plain)
    }

    /// `false` on mismatch and on an unparsable stored hash.
    pub fn verify(&self, plain: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification against the dummy hash. Always `false`.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.dummy_hash);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}
