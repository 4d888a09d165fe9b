/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 * - 1 リクエストの間だけ存在し、永続化しない
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `username` は token の subject (検証済み)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub username: String,
}

impl AuthCtx {
    pub fn new(username: String) -> Self {
        Self { username }
    }
}
