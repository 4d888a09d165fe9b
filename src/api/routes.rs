/*
 * Responsibility
 * - URL 構造を定義
 * - public: /, /health, /api/auth/ 以下
 * - protected: /api/todos (guard を route_layer で適用)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{
    auth::{login, register},
    health::{health, index},
    todos::{create_todo, delete_todo, get_todo, list_todos, update_todo},
};
use crate::middleware::auth::guard;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    let protected = guard::apply(
        Router::new()
            .route("/api/todos", get(list_todos).post(create_todo))
            .route(
                "/api/todos/{id}",
                get(get_todo).put(update_todo).delete(delete_todo),
            ),
    );

    public.merge(protected)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::auth::public::PublicPaths;
    use crate::repos::{MemoryCredentialStore, MemoryTodoStore};
    use crate::services::auth::{
        AuthService, TokenService,
        jwt::{SIGNING_KEY_BYTES, SigningKey},
        password::PasswordHasher,
    };

    fn router() -> Router {
        let key = SigningKey::from_bytes(&[5u8; SIGNING_KEY_BYTES]).unwrap();
        let tokens = Arc::new(TokenService::new(Arc::new(key), 3600));
        let auth = Arc::new(AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::clone(&tokens),
            PasswordHasher::for_tests(),
        ));
        let state = AppState::new(
            auth,
            tokens,
            Arc::new(MemoryTodoStore::new()),
            PublicPaths::default(),
        );
        routes().with_state(state)
    }

    async fn status_of(method: Method, uri: &str) -> StatusCode {
        router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn public_routes_are_mounted_without_guard() {
        assert_eq!(status_of(Method::GET, "/").await, StatusCode::OK);
        assert_eq!(status_of(Method::GET, "/health").await, StatusCode::OK);
        // mounted: an empty body is a client error, not a missing route
        assert_ne!(
            status_of(Method::POST, "/api/auth/register").await,
            StatusCode::NOT_FOUND
        );
        assert_ne!(
            status_of(Method::POST, "/api/auth/login").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn todo_routes_sit_behind_the_guard() {
        for (method, uri) in [
            (Method::GET, "/api/todos"),
            (Method::POST, "/api/todos"),
            (Method::GET, "/api/todos/1"),
            (Method::PUT, "/api/todos/1"),
            (Method::DELETE, "/api/todos/1"),
        ] {
            assert_eq!(
                status_of(method.clone(), uri).await,
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }
}
