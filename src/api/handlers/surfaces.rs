use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::render::canvas::CanvasSnapshot;
use crate::render::scene::SceneSnapshot;

/// GET /api/canvas
pub async fn canvas_snapshot(State(state): State<AppState>) -> Result<Json<CanvasSnapshot>, ApiError> {
    let canvas = state
        .canvas
        .as_ref()
        .ok_or_else(|| ApiError::not_found("No canvas installed"))?;

    let snapshot = canvas.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// GET /api/scene
pub async fn scene_snapshot(State(state): State<AppState>) -> Result<Json<SceneSnapshot>, ApiError> {
    let scene = state
        .scene
        .as_ref()
        .ok_or_else(|| ApiError::not_found("No scene installed"))?;

    let snapshot = scene.lock().await.snapshot();
    Ok(Json(snapshot))
}
