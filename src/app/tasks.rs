use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::{ApiError, api_error};
use crate::state;
use crate::types::task::{NewTask, Task, TaskPatch, TaskStats};

pub(crate) async fn task_list(State(state): State<state::AppState>) -> Json<Vec<Task>> {
    Json(state.service.list_tasks())
}

pub(crate) async fn task_create(
    State(state): State<state::AppState>,
    Json(input): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.service.create_task(input).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(crate) async fn task_stats(State(state): State<state::AppState>) -> Json<TaskStats> {
    Json(state.service.task_stats())
}

pub(crate) async fn task_get(
    State(state): State<state::AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state.service.get_task(&id).map(Json).map_err(api_error)
}

pub(crate) async fn task_update(
    State(state): State<state::AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .service
        .update_task(&id, patch)
        .await
        .map_err(api_error)?;
    Ok(Json(task))
}

pub(crate) async fn task_complete(
    State(state): State<state::AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task = state.service.complete_task(&id).await.map_err(api_error)?;
    Ok(Json(task))
}

pub(crate) async fn task_delete(
    State(state): State<state::AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state.service.delete_task(&id).map(Json).map_err(api_error)
}
