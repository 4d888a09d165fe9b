//! access token (JWT) 検証 → AuthCtx を extensions に入れる
//!
//! - この middleware は拒否しない。identity を「試しに」確立するだけ。
//! - token が無い / 壊れている / 期限切れ / 別 subject の場合は匿名のまま次へ渡す。
//! - 認証必須の判定は `guard` (route_layer) 側で行う。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::services::auth::TokenService;
use crate::state::AppState;

/// Attach identity resolution to every route of `router`.
///
/// ```ignore
/// let app = middleware::auth::access::apply(app, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, attach_identity))
}

async fn attach_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if state.public_paths.is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let auth_ctx = bearer_token(req.headers()).and_then(|token| resolve(&state.tokens, token));

    if let Some(auth_ctx) = auth_ctx {
        // middleware → extractor への受け渡し
        req.extensions_mut().insert(auth_ctx);
    }

    next.run(req).await
}

/// `Authorization: Bearer <token>` → `<token>`. Other schemes and empty tokens are ignored.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn resolve(tokens: &TokenService, token: &str) -> Option<AuthCtx> {
    let subject = match tokens.extract_subject(token) {
        Ok(subject) => subject,
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            return None;
        }
    };

    // subject を取り出した後、その subject に対して改めて validate する
    tokens
        .validate(token, &subject)
        .then(|| AuthCtx::new(subject))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Extension,
        http::{HeaderValue, StatusCode},
        routing::get,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::auth::public::PublicPaths;
    use crate::repos::{MemoryCredentialStore, MemoryTodoStore};
    use crate::services::auth::jwt::{SIGNING_KEY_BYTES, SigningKey};
    use crate::services::auth::password::PasswordHasher;
    use crate::services::auth::AuthService;

    fn state() -> AppState {
        let key = SigningKey::from_bytes(&[3u8; SIGNING_KEY_BYTES]).unwrap();
        let tokens = Arc::new(TokenService::new(Arc::new(key), 3600));
        let auth = Arc::new(AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::clone(&tokens),
            PasswordHasher::for_tests(),
        ));
        AppState::new(
            auth,
            tokens,
            Arc::new(MemoryTodoStore::new()),
            PublicPaths::default(),
        )
    }

    // Echoes the principal (or "anonymous") so the filter can be tested on its own.
    fn probe_router(state: AppState) -> Router {
        async fn whoami(ctx: Option<Extension<AuthCtx>>) -> String {
            ctx.map(|Extension(c)| c.username)
                .unwrap_or_else(|| "anonymous".to_string())
        }

        let router = Router::new()
            .route("/api/todos", get(whoami))
            .route("/api/auth/login", get(whoami));
        apply(router, state.clone()).with_state(state)
    }

    async fn call(router: Router, path: &str, authorization: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri(path);
        if let Some(v) = authorization {
            req = req.header(header::AUTHORIZATION, v);
        }
        let res = router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_token_establishes_principal() {
        let state = state();
        let token = state.tokens.issue("alice").unwrap();

        let (status, body) = call(
            probe_router(state),
            "/api/todos",
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn missing_or_bad_credentials_pass_through_anonymously() {
        let state = state();
        let token = state.tokens.issue("alice").unwrap();
        let expired = state
            .tokens
            .issue_at("alice", Utc::now() - Duration::hours(2))
            .unwrap();

        let cases = [
            None,
            Some("Bearer ".to_string()),
            Some("Bearer    ".to_string()),
            Some("Bearer garbage".to_string()),
            Some(format!("Basic {token}")),
            Some(format!("bearer {token}")),
            Some(format!("Bearer {expired}")),
        ];

        for authorization in cases {
            let (status, body) =
                call(probe_router(state.clone()), "/api/todos", authorization.as_deref()).await;
            // never rejected here
            assert_eq!(status, StatusCode::OK, "{authorization:?}");
            assert_eq!(body, "anonymous", "{authorization:?}");
        }
    }

    #[tokio::test]
    async fn public_paths_skip_identity_resolution() {
        let state = state();
        let token = state.tokens.issue("alice").unwrap();

        let (status, body) = call(
            probe_router(state),
            "/api/auth/login",
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[test]
    fn resolve_admits_only_tokens_that_validate() {
        let state = state();
        let tokens = &state.tokens;

        let fresh = tokens.issue("alice").unwrap();
        let ctx = resolve(tokens, &fresh).unwrap();
        assert_eq!(ctx.username, "alice");

        // a few milliseconds past exp is already expired
        let just_expired = tokens
            .issue_at("alice", Utc::now() - Duration::seconds(3600) - Duration::milliseconds(1500))
            .unwrap();
        assert!(resolve(tokens, &just_expired).is_none());

        let other_key = TokenService::new(
            Arc::new(SigningKey::from_bytes(&[4u8; SIGNING_KEY_BYTES]).unwrap()),
            3600,
        );
        let foreign = other_key.issue("alice").unwrap();
        assert!(resolve(tokens, &foreign).is_none());
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
