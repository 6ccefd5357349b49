use crate::dtos::{
    Ack, CreateTaskRequest, InsertAck, TaskBody, TaskResponse, UpdateAck, UpdateTaskRequest,
};
use crate::error::StoreError;
use crate::models::now_millis;
use crate::services::record_store_operation;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

/// The `:id` segment, unless it is missing or empty.
fn task_id(path: Option<Path<String>>) -> Option<String> {
    path.map(|Path(id)| id).filter(|id| !id.is_empty())
}

fn rejected() -> Response {
    Json(Ack::rejected()).into_response()
}

/// Records the outcome of a store call and logs failures.
fn observe<T>(operation: &'static str, result: Result<T, StoreError>) -> Result<T, StoreError> {
    record_store_operation(operation, result.is_ok());
    result.map_err(|e| {
        tracing::warn!(operation = operation, error = %e, "Task store operation failed");
        e
    })
}

/// GET /tasks
pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let tasks = observe("find_all", state.store.find_all().await)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Option<Json<TaskBody>>,
) -> Result<Response, StoreError> {
    let body = match body {
        Some(Json(body)) if !body.is_empty() => body,
        _ => return Ok(rejected()),
    };

    let task = CreateTaskRequest::from_body(&body).into_task(now_millis())?;
    let task = observe("insert_one", state.store.insert_one(task).await)?;

    if let Some(id) = &task.id {
        tracing::info!(task_id = %id, "Task created");
    }

    Ok(Json(InsertAck::new(task)).into_response())
}

/// GET /tasks/:id
///
/// A missing document is answered with `null`, not a not-found status.
pub async fn get_task(
    State(state): State<AppState>,
    path: Option<Path<String>>,
) -> Result<Response, StoreError> {
    let Some(id) = task_id(path) else {
        return Ok(rejected());
    };

    let id = ObjectId::parse_str(&id)?;
    let task = observe("find_by_id", state.store.find_by_id(id).await)?;

    Ok(Json(task.map(TaskResponse::from)).into_response())
}

/// PUT /tasks/:id
///
/// Only truthy `text` / `completed` values are written, and an unknown id is
/// upserted. A request without a JSON body still stamps `modified`; a body
/// that fails to parse is rejected like on create.
pub async fn update_task(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    body: Result<Json<TaskBody>, JsonRejection>,
) -> Result<Response, StoreError> {
    let Some(id) = task_id(path) else {
        return Ok(rejected());
    };
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => TaskBody::new(),
        Err(_) => return Ok(rejected()),
    };

    let id = ObjectId::parse_str(&id)?;
    let changes = UpdateTaskRequest::from_body(&body).into_changes(now_millis())?;

    let previous = observe(
        "find_and_update_by_id",
        state.store.find_and_update_by_id(id, changes).await,
    )?;

    if previous.is_none() {
        tracing::info!(task_id = %id, "Task upserted by update");
    }

    Ok(Json(UpdateAck::new(id, previous)).into_response())
}

/// DELETE /tasks/:id
///
/// `{ok: 1}` whether or not a document existed; any failure is a 500 with
/// `{ok: 0}`.
pub async fn delete_task(
    State(state): State<AppState>,
    path: Option<Path<String>>,
) -> Response {
    let Some(id) = task_id(path) else {
        return rejected();
    };

    match remove_task(&state, &id).await {
        Ok(()) => Json(Ack::accepted()).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(Ack::rejected())).into_response(),
    }
}

async fn remove_task(state: &AppState, id: &str) -> Result<(), StoreError> {
    let id = ObjectId::parse_str(id)?;
    let removed = observe(
        "find_and_delete_by_id",
        state.store.find_and_delete_by_id(id).await,
    )?;

    if removed.is_some() {
        tracing::info!(task_id = %id, "Task deleted");
    }

    Ok(())
}
