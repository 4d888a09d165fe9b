/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / AuthError を統一的に変換
 */
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("Username already exists")]
    Conflict,
    #[error("Invalid credentials")]
    InvalidCredentials,
    // missing, expired, forged and foreign tokens all end up here
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            // duplicate usernames are reported as 400, not 409
            AppError::Conflict => (
                StatusCode::BAD_REQUEST,
                "CONFLICT",
                "Username already exists".into(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".into(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".into(),
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

// Malformed / incomplete JSON bodies are input errors like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

// e.g. a non-numeric `{id}`
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        tracing::error!(error = ?e, "repository failure");
        AppError::Internal
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Conflict => AppError::Conflict,
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::Internal => AppError::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        let cases = [
            (AppError::bad_request("BAD_REQUEST", "x"), StatusCode::BAD_REQUEST),
            (AppError::Conflict, StatusCode::BAD_REQUEST),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::not_found("todo"), StatusCode::NOT_FOUND),
            (AppError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn auth_errors_map_without_leaking_detail() {
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::InvalidCredentials
        ));
        assert!(matches!(AppError::from(AuthError::Conflict), AppError::Conflict));
        assert!(matches!(AppError::from(RepoError::Conflict), AppError::Internal));
    }
}
