//! 認証必須の route に掛ける guard
//!
//! `access` が AuthCtx を載せていなければ 401。理由 (無い / 不正 / 期限切れ) は区別しない。

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Require a principal on every route registered on `router` so far.
pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.route_layer(middleware::from_fn(require_auth))
}

async fn require_auth(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<AuthCtx>().is_none() {
        tracing::debug!(path = %req.uri().path(), "anonymous request to protected route");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}
