/*
 * Responsibility
 * - register / login の request/response DTO
 * - password は Debug に出さない
 */
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AuthRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.password.trim().is_empty() {
            return Err("password is required");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: u64,
}
