// HTTP surface for embedding the agent session

pub mod errors;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};

use crate::render::canvas::{RecordingCanvas, SharedCanvas};
use crate::render::scene::{InMemoryScene, SharedScene};
use crate::session::SwarmSession;
use handlers::{goals, health, surfaces};

pub use errors::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SwarmSession>,
    pub canvas: Option<SharedCanvas<RecordingCanvas>>,
    pub scene: Option<SharedScene<InMemoryScene>>,
    pub goal_timeout: Duration,
}

/// Build the application routes
///
/// Middleware layers are left to the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Goals
        .route("/api/goals", post(goals::submit_goal))
        .route("/api/logs", get(goals::list_logs))
        // Surfaces
        .route("/api/canvas", get(surfaces::canvas_snapshot))
        .route("/api/scene", get(surfaces::scene_snapshot))
        .with_state(state)
}
