/// Scenario endpoints
///
/// # Endpoints
///
/// - `POST   /v1/scenarios` - Create a scenario
/// - `GET    /v1/scenarios` - List scenarios
/// - `GET    /v1/scenarios/:id` - Scenario with its tasks in sequence order
/// - `DELETE /v1/scenarios/:id` - Delete a scenario and its tasks
/// - `POST   /v1/scenarios/:id/tasks` - Add a task to a scenario

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
    routes::tasks::{CreateTaskRequest, TaskResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskchain_shared::models::scenario::Scenario;

/// Create scenario request
#[derive(Debug, Deserialize)]
pub struct CreateScenarioRequest {
    pub name: String,
}

/// Scenario with its tasks
#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioBoardResponse {
    pub scenario: Scenario,
    pub tasks: Vec<TaskResponse>,
}

/// Creates an empty scenario owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: empty or overlong name
pub async fn create_scenario(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateScenarioRequest>,
) -> ApiResult<(StatusCode, Json<Scenario>)> {
    let scenario = state
        .workflow
        .create_scenario(&req.name, Some(auth.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(scenario)))
}

/// Lists all scenarios, oldest first
pub async fn list_scenarios(State(state): State<AppState>) -> ApiResult<Json<Vec<Scenario>>> {
    Ok(Json(state.workflow.list_scenarios().await?))
}

/// Gets a scenario with its tasks
///
/// # Errors
///
/// - `404 Not Found`: no such scenario
pub async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ScenarioBoardResponse>> {
    let board = state.workflow.scenario_board(id).await?;
    Ok(Json(ScenarioBoardResponse {
        scenario: board.scenario,
        tasks: board.tasks.into_iter().map(Into::into).collect(),
    }))
}

/// Deletes a scenario and every task in it
///
/// # Errors
///
/// - `404 Not Found`: no such scenario
pub async fn delete_scenario(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.workflow.delete_scenario(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a task to a scenario
///
/// The first task of a scenario with nothing released is released at once.
///
/// # Errors
///
/// - `404 Not Found`: no such scenario
/// - `400 Bad Request`: empty or overlong description or owner
pub async fn create_scenario_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state.workflow.create_task(req.into_new_task(Some(id))).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}
