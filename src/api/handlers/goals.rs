use axum::{extract::State, Json};
use serde::Deserialize;

use crate::agents::{LogEntry, StatusReport};
use crate::api::errors::ApiError;
use crate::api::AppState;

/// Request body for submitting a goal
#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub goal: String,
}

/// Run a goal and wait for its outcome
///
/// POST /api/goals
pub async fn submit_goal(
    State(state): State<AppState>,
    Json(req): Json<GoalRequest>,
) -> Result<Json<StatusReport>, ApiError> {
    if req.goal.trim().is_empty() {
        return Err(ApiError::bad_request("Goal must not be empty"));
    }

    let report = state.session.run_goal(&req.goal, state.goal_timeout).await?;

    Ok(Json(report))
}

/// Recent bus traffic, oldest first
///
/// GET /api/logs
pub async fn list_logs(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.session.logs())
}
