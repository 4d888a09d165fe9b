/*
 * Responsibility
 * - POST /api/auth/register, POST /api/auth/login
 * - DTO validation → AuthService 呼び出し → token を返す
 * - 失敗理由の詳細 (ユーザー不在 / パスワード不一致) は返さない
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::api::dto::auth::{AuthRequest, AuthResponse};
use crate::error::AppError;
use crate::services::auth::IssuedToken;
use crate::state::AppState;

fn to_response(issued: IssuedToken) -> Json<AuthResponse> {
    Json(AuthResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
    })
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()
        .map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))?;

    let issued = state.auth.register(&req.username, &req.password).await?;
    Ok(to_response(issued))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()
        .map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))?;

    let issued = state.auth.login(&req.username, &req.password).await?;
    Ok(to_response(issued))
}
