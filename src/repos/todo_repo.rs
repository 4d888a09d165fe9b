/*
 * Responsibility
 * - todos CRUD
 * - id は store 側で採番する (クライアント指定の id は使わない)
 */
use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::repos::error::RepoResult;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TodoRow {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<TodoRow>>;

    async fn create(&self, title: &str, completed: bool) -> RepoResult<TodoRow>;

    async fn get(&self, id: i64) -> RepoResult<Option<TodoRow>>;

    async fn update(&self, id: i64, title: &str, completed: bool) -> RepoResult<Option<TodoRow>>;

    async fn delete(&self, id: i64) -> RepoResult<bool>;
}

#[derive(Clone, Debug)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn list(&self) -> RepoResult<Vec<TodoRow>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, completed
            FROM todos
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, title: &str, completed: bool) -> RepoResult<TodoRow> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            INSERT INTO todos (title, completed)
            VALUES ($1, $2)
            RETURNING id, title, completed
            "#,
        )
        .bind(title)
        .bind(completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> RepoResult<Option<TodoRow>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, completed
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: i64, title: &str, completed: bool) -> RepoResult<Option<TodoRow>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos
            SET title = $2, completed = $3
            WHERE id = $1
            RETURNING id, title, completed
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    inner: RwLock<MemoryTodos>,
}

#[derive(Debug, Default)]
struct MemoryTodos {
    next_id: i64,
    rows: BTreeMap<i64, TodoRow>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list(&self) -> RepoResult<Vec<TodoRow>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn create(&self, title: &str, completed: bool) -> RepoResult<TodoRow> {
        let mut todos = self.inner.write().await;
        todos.next_id += 1;
        let row = TodoRow {
            id: todos.next_id,
            title: title.to_string(),
            completed,
        };
        todos.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> RepoResult<Option<TodoRow>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i64, title: &str, completed: bool) -> RepoResult<Option<TodoRow>> {
        let mut todos = self.inner.write().await;
        Ok(todos.rows.get_mut(&id).map(|row| {
            row.title = title.to_string();
            row.completed = completed;
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}
