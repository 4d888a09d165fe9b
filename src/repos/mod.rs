/*
 * Responsibility
 * - 永続化層の公開インターフェース
 * - Postgres 実装と in-memory 実装は同じ trait を満たす
 */
pub mod error;
pub mod todo_repo;
pub mod user_repo;

pub use error::RepoError;
pub use todo_repo::{MemoryTodoStore, PgTodoStore, TodoRow, TodoStore};
pub use user_repo::{CredentialStore, MemoryCredentialStore, PgCredentialStore};

/// Apply the bundled schema migrations.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
