use axum::{
    routing::{get, post},
    Router,
};
use mockexam_backend::{
    config::{get_config, init_config},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    init_config()?;
    let config = get_config();

    info!("Initializing exam generation service...");
    let app_state = AppState::init(config).await?;
    if config.llm.api_key.is_none() {
        tracing::warn!("LLM_API_KEY is not set; every generation task will report an error");
    }
    info!("Exam generation service initialized");

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/exams/supported", get(routes::exam::list_supported_exams))
        .route("/api/exams/generate", post(routes::exam::generate_exam))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
