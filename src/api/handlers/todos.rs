/*
 * Responsibility
 * - /api/todos 系 CRUD handler
 * - 認証必須 (guard + AuthCtxExtractor)。所有者による絞り込みはしない
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{
    api::{
        dto::todos::{TodoRequest, TodoResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    state::AppState,
};

fn validated(req: &TodoRequest) -> Result<(), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))
}

pub async fn list_todos(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let rows = state.todos.list().await?;
    Ok(Json(rows.into_iter().map(TodoResponse::from).collect()))
}

pub async fn create_todo(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    payload: Result<Json<TodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let Json(req) = payload?;
    validated(&req)?;

    let row = state.todos.create(&req.title, req.completed).await?;
    tracing::debug!(todo_id = row.id, username = %ctx.username, "todo created");

    Ok(Json(row.into()))
}

pub async fn get_todo(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let Path(id) = path?;
    let row = state
        .todos
        .get(id)
        .await?
        .ok_or(AppError::not_found("todo"))?;

    Ok(Json(row.into()))
}

pub async fn update_todo(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let Path(id) = path?;
    let Json(req) = payload?;
    validated(&req)?;

    let row = state
        .todos
        .update(id, &req.title, req.completed)
        .await?
        .ok_or(AppError::not_found("todo"))?;
    tracing::debug!(todo_id = row.id, username = %ctx.username, "todo updated");

    Ok(Json(row.into()))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    if !state.todos.delete(id).await? {
        return Err(AppError::not_found("todo"));
    }
    tracing::debug!(todo_id = id, username = %ctx.username, "todo deleted");

    Ok(StatusCode::NO_CONTENT)
}
