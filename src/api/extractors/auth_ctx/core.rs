use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::AuthCtx;

/// Handler で AuthCtx を受け取るための extractor
/// middleware が AuthCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（token 無し・不正・期限切れを区別しない）
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn extracts_principal_from_extensions() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(AuthCtx::new("alice".to_string()));

        let AuthCtxExtractor(ctx) = AuthCtxExtractor::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.username, "alice");
    }

    #[tokio::test]
    async fn missing_principal_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let rejection = AuthCtxExtractor::from_request_parts(&mut parts, &()).await;
        assert!(matches!(rejection, Err(AppError::Unauthorized)));
    }
}
