/*
 * Responsibility
 * - users (credential) テーブル向けの操作
 * - username の一意性は store 側で保証する (check + insert を分割しない)
 * - password_hash は呼び出し側で生成済みのものだけを受け取る
 */
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the password hash
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Username -> password hash storage.
///
/// `insert` must fail with `RepoError::Conflict` when the username is taken,
/// even when two registrations race.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>>;

    async fn exists(&self, username: &str) -> RepoResult<bool>;

    async fn insert(&self, username: &str, password_hash: &str) -> RepoResult<UserRow>;
}

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn exists(&self, username: &str) -> RepoResult<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn insert(&self, username: &str, password_hash: &str) -> RepoResult<UserRow> {
        // UNIQUE(username) がレースを解決する
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }
}

/// Process-local credential store, used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<MemoryUsers>,
}

#[derive(Debug, Default)]
struct MemoryUsers {
    next_id: i64,
    by_username: HashMap<String, UserRow>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        Ok(self.inner.read().await.by_username.get(username).cloned())
    }

    async fn exists(&self, username: &str) -> RepoResult<bool> {
        Ok(self.inner.read().await.by_username.contains_key(username))
    }

    async fn insert(&self, username: &str, password_hash: &str) -> RepoResult<UserRow> {
        // check + insert under one write lock
        let mut users = self.inner.write().await;
        if users.by_username.contains_key(username) {
            return Err(RepoError::Conflict);
        }

        users.next_id += 1;
        let row = UserRow {
            id: users.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.by_username.insert(username.to_string(), row.clone());

        Ok(row)
    }
}
