//! End-to-end API integration tests
//!
//! These tests verify the complete HTTP API flows including:
//! - Goal submission and validation
//! - Surface snapshots after a goal ran
//! - Traffic log listing

use std::sync::Arc;
use std::time::Duration;

use agent_swarm::api::{self, AppState};
use agent_swarm::llm::ScriptedModel;
use agent_swarm::render::canvas::RecordingCanvas;
use agent_swarm::render::scene::InMemoryScene;
use agent_swarm::session::SwarmSession;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt; // for oneshot

/// Setup test application with a scripted model
fn setup_app(answers: &[&str]) -> Router {
    let model = Arc::new(ScriptedModel::new(answers.iter().copied()));
    let canvas = Arc::new(Mutex::new(RecordingCanvas::new(320, 240)));
    let scene = Arc::new(Mutex::new(InMemoryScene::new()));

    let session = SwarmSession::builder(model)
        .with_canvas(canvas.clone())
        .with_scene(scene.clone())
        .build();

    api::router(AppState {
        session: Arc::new(session),
        canvas: Some(canvas),
        scene: Some(scene),
        goal_timeout: Duration::from_secs(5),
    })
}

fn post_goal(goal: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/goals")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "goal": goal }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app(&[]);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_goal_draws_on_canvas() {
    let app = setup_app(&[
        "canvas_expert",
        r#"[{"action":"fill_rect","params":{"x":10,"y":10,"width":50,"height":50,"color":"red"}}]"#,
    ]);

    let response = app.clone().oneshot(post_goal("Draw a red square")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "complete"}));

    let response = app.clone().oneshot(get("/api/canvas")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let canvas = json_body(response).await;
    assert_eq!(canvas["width"], 320);
    assert_eq!(
        canvas["operations"],
        json!([{
            "op": "fill_rect",
            "rect": {"x": 10.0, "y": 10.0, "width": 50.0, "height": 50.0},
            "fill": {"kind": "color", "color": "red"}
        }])
    );

    let response = app.oneshot(get("/api/logs")).await.unwrap();
    let logs = json_body(response).await;
    assert_eq!(logs.as_array().unwrap().len(), 4);
    assert_eq!(logs[3]["line"], r#"[manager -> ui]: {"status":"complete"}"#);
}

#[tokio::test]
async fn test_empty_goal_is_rejected() {
    let app = setup_app(&[]);

    let response = app.oneshot(post_goal("   ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Goal must not be empty");
}

#[tokio::test]
async fn test_scene_snapshot_after_goal() {
    let app = setup_app(&[
        "scene_expert",
        r#"[{"action":"create_mesh","params":{"id":"ball","geometry":"SphereGeometry"}}]"#,
    ]);

    let response = app.clone().oneshot(post_goal("A ball")).await.unwrap();
    assert_eq!(json_body(response).await, json!({"status": "complete"}));

    let response = app.oneshot(get("/api/scene")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let scene = json_body(response).await;
    assert_eq!(scene["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(scene["nodes"][0]["kind"]["node"], "mesh");
}

#[tokio::test]
async fn test_failed_goal_returns_error_report() {
    let app = setup_app(&["canvas_expert", "not json"]);

    let response = app.oneshot(post_goal("Draw")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["status"], "error");
    assert!(report["error"]
        .as_str()
        .unwrap()
        .starts_with("Canvas expert failed to produce valid JSON"));
}
