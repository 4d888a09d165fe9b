/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthService, tokens: TokenService, todos: TodoStore, public_paths
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::public::PublicPaths;
use crate::repos::TodoStore;
use crate::services::auth::{AuthService, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
    pub todos: Arc<dyn TodoStore>,
    pub public_paths: Arc<PublicPaths>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .field("tokens", &self.tokens)
            .field("public_paths", &self.public_paths)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        auth: Arc<AuthService>,
        tokens: Arc<TokenService>,
        todos: Arc<dyn TodoStore>,
        public_paths: PublicPaths,
    ) -> Self {
        Self {
            auth,
            tokens,
            todos,
            public_paths: Arc::new(public_paths),
        }
    }
}
