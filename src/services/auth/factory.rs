/// Factory: build the token + authentication services from application `Config`.
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::repos::CredentialStore;
use crate::services::auth::jwt::{KeyError, SigningKey, TokenService};
use crate::services::auth::password::{PasswordError, PasswordHasher};
use crate::services::auth::service::AuthService;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Generates the process signing key. Call once per process.
pub fn build_auth_services(
    config: &Config,
    users: Arc<dyn CredentialStore>,
) -> Result<(Arc<TokenService>, Arc<AuthService>), SetupError> {
    let key = Arc::new(SigningKey::generate()?);
    let tokens = Arc::new(TokenService::new(key, config.access_token_ttl_seconds));
    let auth = Arc::new(AuthService::new(
        users,
        Arc::clone(&tokens),
        PasswordHasher::new()?,
    ));

    Ok((tokens, auth))
}
