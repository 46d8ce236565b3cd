use std::sync::Arc;

use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use agent_swarm::api::{self, AppState};
use agent_swarm::config::AppConfig;
use agent_swarm::llm::OllamaClient;
use agent_swarm::render::canvas::RecordingCanvas;
use agent_swarm::render::scene::InMemoryScene;
use agent_swarm::session::SwarmSession;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agent_swarm=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!(
        url = %config.llm.base_url,
        model = %config.llm.model,
        "Using language model"
    );
    let model = Arc::new(OllamaClient::new(config.llm.clone()));

    // Rendering surfaces
    let canvas = Arc::new(Mutex::new(RecordingCanvas::new(
        config.canvas_width,
        config.canvas_height,
    )));
    let scene = Arc::new(Mutex::new(InMemoryScene::new()));

    let session = SwarmSession::builder(model)
        .batch_policy(config.batch_policy)
        .log_capacity(config.log_capacity)
        .with_canvas(canvas.clone())
        .with_scene(scene.clone())
        .build();

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = api::router(AppState {
        session: Arc::new(session),
        canvas: Some(canvas),
        scene: Some(scene),
        goal_timeout: config.goal_timeout,
    })
    // Middleware
    .layer(TraceLayer::new_for_http())
    .layer(cors);

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
