use axum::{extract::{Path, State}, routing::{get, put}, Json, Router};
use axum::http::StatusCode;

use crate::{
    application::todo_service::TodoService,
    domain::todo::{Todo, TodoId, TodoInput, TodoPatch},
    http::types::ApiError,
};

pub const HEALTH_MESSAGE: &str = "Todo App is running!";

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/health", get(health))
        .route("/todos/status/:completed", get(todos_by_status::<S>))
        .route("/todos/priority/:priority", get(todos_by_priority::<S>))
        .route("/todos/search/:title", get(search_todos::<S>))
        .route("/todos/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .route("/todos/:id/complete", put(mark_completed::<S>))
        .route("/todos/:id/incomplete", put(mark_incomplete::<S>))
        .with_state(state)
}

type ApiResult<T> = Result<T, ApiError>;

async fn health() -> &'static str { HEALTH_MESSAGE }

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(state.service.list().await?))
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, Json(payload): Json<TodoInput>) -> ApiResult<(StatusCode, Json<Todo>)> {
    let todo = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Json<Todo>> {
    found(state.service.get(&TodoId(id)).await?)
}

async fn update_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, Json(payload): Json<TodoPatch>) -> ApiResult<Json<Todo>> {
    found(state.service.update(&TodoId(id), payload).await?)
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    if state.service.delete(&TodoId(id)).await? { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::NotFound) }
}

async fn todos_by_status<S: TodoService>(State(state): State<AppState<S>>, Path(completed): Path<String>) -> ApiResult<Json<Vec<Todo>>> {
    let completed = parse_flag(&completed).ok_or_else(|| ApiError::BadRequest(format!("invalid boolean {completed:?}")))?;
    Ok(Json(state.service.list_by_status(completed).await?))
}

async fn todos_by_priority<S: TodoService>(State(state): State<AppState<S>>, Path(priority): Path<String>) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(state.service.list_by_priority(&priority).await?))
}

async fn search_todos<S: TodoService>(State(state): State<AppState<S>>, Path(title): Path<String>) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(state.service.search_by_title(&title).await?))
}

async fn mark_completed<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Json<Todo>> {
    found(state.service.mark_completed(&TodoId(id)).await?)
}

async fn mark_incomplete<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Json<Todo>> {
    found(state.service.mark_incomplete(&TodoId(id)).await?)
}

/// Case-insensitive `true/false`, `yes/no`, `on/off`, `1/0`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn found(todo: Option<Todo>) -> ApiResult<Json<Todo>> { todo.map(Json).ok_or(ApiError::NotFound) }
