//! Rubu Romance - a companion chat over Gemini
//!
//! A Rust backend implementing a conversation state machine between the
//! user and a persona-driven partner.

mod api;
mod llm;
mod persona;
mod profile;
mod runtime;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use llm::LlmConfig;
use runtime::LlmBackend;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rubu_romance=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let port: u16 = std::env::var("RUBU_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Missing credentials are reported per session, not at startup
    let llm_config = LlmConfig::from_env();
    if llm_config.has_credentials() {
        tracing::info!(model = %llm_config.model.model_id(), "Gemini configured");
    } else {
        tracing::warn!("No Gemini API key configured. Set GEMINI_API_KEY or LLM_GATEWAY.");
    }
    let service = llm::build_service(&llm_config)?;
    let state = AppState::new(Arc::new(LlmBackend::new(service)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Rubu Romance server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
