/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List ungrouped tasks
/// - `POST   /v1/tasks` - Create an ungrouped task
/// - `GET    /v1/tasks/:id` - Get one task
/// - `DELETE /v1/tasks/:id` - Delete a task
/// - `POST   /v1/tasks/:id/complete` - Complete a task as the caller
/// - `POST   /v1/tasks/:id/release` - Release a locked task by hand
///
/// Every endpoint requires a bearer token. Completion is checked against
/// the caller's username; the other operations are open to any
/// authenticated user.

use crate::{app::AppState, error::ApiResult, middleware::auth::AuthContext};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskchain_shared::{
    models::task::{Task, TaskStatus},
    workflow::{CompletionOutcome, NewTask},
};

/// Task as returned by the API, with its derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: i64,
    pub scenario_id: Option<i64>,
    pub sequence_number: i32,
    pub description: String,
    pub owner: String,
    pub status: TaskStatus,
    pub released_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            status: task.status(),
            id: task.id,
            scenario_id: task.scenario_id,
            sequence_number: task.sequence_number,
            description: task.description,
            owner: task.owner,
            released_at: task.released_at,
            completed_at: task.completed_at,
            created_at: task.created_at,
        }
    }
}

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub sequence_number: i32,
    pub description: String,
    pub owner: String,
}

impl CreateTaskRequest {
    /// Input for the workflow service, placed in `scenario_id`
    pub fn into_new_task(self, scenario_id: Option<i64>) -> NewTask {
        NewTask {
            scenario_id,
            sequence_number: self.sequence_number,
            description: self.description,
            owner: self.owner,
        }
    }
}

/// Completion response
///
/// ```json
/// {
///   "outcome": "newly_released_successor",
///   "task": { "id": 1, "status": "completed", ... },
///   "newly_released": { "id": 2, "status": "released", ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// `completed` or `newly_released_successor`
    pub outcome: String,

    /// The completed task
    pub task: TaskResponse,

    /// Successor released by this completion
    pub newly_released: Option<TaskResponse>,
}

impl From<CompletionOutcome> for CompletionResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        Self {
            outcome: outcome.kind().as_str().to_string(),
            task: outcome.completed_task.into(),
            newly_released: outcome.newly_released.map(Into::into),
        }
    }
}

/// Lists tasks that belong to no scenario, in sequence order
pub async fn list_ungrouped_tasks(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state.workflow.list_ungrouped_tasks().await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Creates a task outside any scenario
pub async fn create_ungrouped_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state.workflow.create_task(req.into_new_task(None)).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Gets one task
///
/// # Errors
///
/// - `404 Not Found`: no such task
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.workflow.get_task(id).await?;
    Ok(Json(task.into()))
}

/// Deletes a task that is not completed; its siblings keep their release state
///
/// # Errors
///
/// - `409 already_completed`: completed tasks are kept
/// - `404 Not Found`: no such task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.workflow.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Completes a task on behalf of the caller
///
/// # Errors
///
/// - `403 not_owner`: the caller does not own the task
/// - `409 not_released`: the task is still locked
/// - `409 already_completed`: the task was completed before
/// - `404 Not Found`: no such task
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CompletionResponse>> {
    let outcome = state.workflow.complete_task(id, &auth).await?;
    Ok(Json(outcome.into()))
}

/// Releases a locked task regardless of its predecessor
///
/// # Errors
///
/// - `409 already_released`: the task is already released or completed
/// - `404 Not Found`: no such task
pub async fn release_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.workflow.release_task(id).await?;
    tracing::info!(task_id = id, username = %auth.username, "Task released by user");
    Ok(Json(task.into()))
}
