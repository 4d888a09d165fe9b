use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::repos::{CredentialStore, RepoError};
use crate::services::auth::jwt::TokenService;
use crate::services::auth::password::PasswordHasher;

/// Failures visible to the HTTP layer.
///
/// `InvalidCredentials` covers both "no such user" and "wrong password".
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already exists")]
    Conflict,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("internal error")]
    Internal,
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Orchestrates registration (store + hash) and login (verify + issue).
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let taken = self.users.exists(username).await.map_err(|e| {
            error!(error = ?e, "credential lookup failed");
            AuthError::Internal
        })?;
        if taken {
            info!(username = %username, "registration rejected: username taken");
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hash_off_thread(password).await?;

        match self.users.insert(username, &password_hash).await {
            Ok(row) => {
                info!(user_id = row.id, username = %row.username, "user registered");
            }
            // lost a race against a concurrent registration
            Err(RepoError::Conflict) => {
                info!(username = %username, "registration rejected: username taken");
                return Err(AuthError::Conflict);
            }
            Err(e) => {
                error!(error = ?e, "failed to store credentials");
                return Err(AuthError::Internal);
            }
        }

        self.issue(username)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let user = self.users.find_by_username(username).await.map_err(|e| {
            error!(error = ?e, "credential lookup failed");
            AuthError::Internal
        })?;

        let verified = self
            .verify_off_thread(password, user.map(|row| row.password_hash))
            .await?;

        if !verified {
            debug!(username = %username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        info!(username = %username, "login succeeded");
        self.issue(username)
    }

    fn issue(&self, username: &str) -> Result<IssuedToken, AuthError> {
        let token = self.tokens.issue(username).map_err(|e| {
            error!(error = ?e, "failed to issue access token");
            AuthError::Internal
        })?;

        Ok(IssuedToken {
            token,
            expires_in: self.tokens.ttl_seconds(),
        })
    }

    // Argon2 is CPU-bound; keep it off the async worker threads.
    async fn hash_off_thread(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                error!(error = ?e, "password hashing task failed");
                AuthError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "password hashing failed");
                AuthError::Internal
            })
    }

    // `None` runs a dummy verification so both rejection paths cost the same.
    async fn verify_off_thread(
        &self,
        password: &str,
        stored_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| {
            error!(error = ?e, "password verification task failed");
            AuthError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::MemoryCredentialStore;
    use crate::services::auth::jwt::{SIGNING_KEY_BYTES, SigningKey};

    struct Fixture {
        users: Arc<MemoryCredentialStore>,
        tokens: Arc<TokenService>,
        auth: AuthService,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryCredentialStore::new());
        let key = SigningKey::from_bytes(&[9u8; SIGNING_KEY_BYTES]).unwrap();
        let tokens = Arc::new(TokenService::new(Arc::new(key), 4 * 60 * 60));
        let auth = AuthService::new(
            users.clone() as Arc<dyn CredentialStore>,
            Arc::clone(&tokens),
            PasswordHasher::for_tests(),
        );
        Fixture {
            users,
            tokens,
            auth,
        }
    }

    #[tokio::test]
    async fn register_then_login_issue_tokens_for_the_user() {
        let f = fixture();

        let registered = f.auth.register("alice", "secret123").await.unwrap();
        let logged_in = f.auth.login("alice", "secret123").await.unwrap();

        assert_ne!(registered.token, logged_in.token);
        assert!(f.tokens.validate(&registered.token, "alice"));
        assert!(f.tokens.validate(&logged_in.token, "alice"));
        assert_eq!(registered.expires_in, 4 * 60 * 60);
    }

    #[tokio::test]
    async fn stored_credential_is_a_hash() {
        let f = fixture();
        f.auth.register("alice", "secret123").await.unwrap();

        let row = f.users.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(row.password_hash, "secret123");
        assert!(row.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_keeps_original_hash() {
        let f = fixture();
        f.auth.register("alice", "secret123").await.unwrap();
        let before = f.users.find_by_username("alice").await.unwrap().unwrap();

        for password in ["secret123", "other-password"] {
            let err = f.auth.register("alice", password).await.unwrap_err();
            assert!(matches!(err, AuthError::Conflict));
        }

        let after = f.users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
        assert!(f.auth.login("alice", "secret123").await.is_ok());
        assert!(f.auth.login("alice", "other-password").await.is_err());
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let f = fixture();
        f.auth.register("alice", "secret123").await.unwrap();

        assert!(f.auth.register("Alice", "secret123").await.is_ok());
        assert!(matches!(
            f.auth.login("ALICE", "secret123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let f = fixture();
        f.auth.register("alice", "secret123").await.unwrap();

        let wrong_password = f.auth.login("alice", "nope").await.unwrap_err();
        let unknown_user = f.auth.login("mallory", "secret123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_admit_one_winner() {
        let f = fixture();
        let auth = Arc::new(f.auth);

        let mut handles = Vec::new();
        for i in 0..8 {
            let auth = Arc::clone(&auth);
            handles.push(tokio::spawn(async move {
                auth.register("racer", &format!("password-{i}")).await
            }));
        }

        let mut winners = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => winners += 1,
                Err(AuthError::Conflict) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(winners, 1);
    }
}
