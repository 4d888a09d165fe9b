//! Access token issuance and verification (HS256 JWT).
//!
//! - One `SigningKey` per process, generated at startup and shared by handle.
//!   Tokens signed by a previous process instance never verify again.
//! - `validate` is total: every failure (decode, signature, expiry, subject) is `false`.
//!   The reason is only visible through `check_at`, for logging and tests.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Size of a freshly generated HMAC secret (256 bits, matches HS256).
pub const SIGNING_KEY_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to gather randomness for the signing key: {0}")]
    Rng(getrandom::Error),
    #[error("signing key must be at least {SIGNING_KEY_BYTES} bytes")]
    TooShort,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed or unverifiable token")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Process-wide HMAC secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Draw a new secret from the OS RNG.
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = [0u8; SIGNING_KEY_BYTES];
        getrandom::fill(&mut bytes).map_err(KeyError::Rng)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(secret: &[u8]) -> Result<Self, KeyError> {
        if secret.len() < SIGNING_KEY_BYTES {
            return Err(KeyError::TooShort);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Outcome of a full token check, most specific failure first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Valid,
    Malformed,
    Expired,
    SubjectMismatch,
}

#[derive(Clone)]
pub struct TokenService {
    key: Arc<SigningKey>,
    ttl_seconds: u64,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(key: Arc<SigningKey>, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared in `check_at` against the caller's clock, without leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            key,
            ttl_seconds,
            validation,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.key.encoding).map_err(TokenError::Sign)
    }

    /// Verify structure + signature and return the claims. Expiry is not checked here.
    fn decode(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &self.key.decoding,
            &self.validation,
        )
        .map_err(TokenError::Malformed)?;

        Ok(data.claims)
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }

    pub fn check_at(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> TokenCheck {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(_) => return TokenCheck::Malformed,
        };

        // exp is whole seconds; compare at millisecond precision so `exp + ε` is already expired
        if now.timestamp_millis() > claims.exp.saturating_mul(1000) {
            return TokenCheck::Expired;
        }
        if claims.sub != expected_subject {
            return TokenCheck::SubjectMismatch;
        }

        TokenCheck::Valid
    }

    /// Total: any failure is `false`. The reason only reaches the debug log.
    pub fn validate_at(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> bool {
        match self.check_at(token, expected_subject, now) {
            TokenCheck::Valid => true,
            outcome => {
                tracing::debug!(?outcome, "access token rejected");
                false
            }
        }
    }

    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        self.validate_at(token, expected_subject, Utc::now())
    }
}
