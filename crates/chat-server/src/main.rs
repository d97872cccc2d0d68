//! sai-chat HTTP Server
//!
//! Axum-based server for the chat app: auth, session chats behind the daily
//! quota gate, the mocked payment flow and the admin surface. Serves the WASM
//! frontend from `STATIC_DIR`.

mod auth;
mod config;
mod error;
mod routes;
mod service;
mod state;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use chat_core::{Assistant, AssistantConfig, CompletionProvider, SystemClock};
use chat_runtime::OpenAiProvider;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider = Arc::new(OpenAiProvider::from_env());
    match provider.health_check().await {
        Ok(true) => tracing::info!(model = %provider.config().model, "✓ Connected to LLM provider"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ LLM provider not available - replies will use fallback content");
            tracing::warn!("  Set OPENAI_API_KEY (and OPENAI_BASE_URL if self-hosted) in .env");
        }
    }

    let mut assistant_config = AssistantConfig::default();
    assistant_config.generation.model = provider.config().model.clone();
    assistant_config.image.model = provider.config().image_model.clone();
    let assistant = Assistant::new(provider.clone(), provider, assistant_config);

    if config.admin_emails.is_empty() {
        tracing::warn!("⚠ ADMIN_EMAILS not set - nobody can open the admin page");
    }

    let state = AppState::new(config.clone(), assistant, Arc::new(SystemClock))?;

    // Static files (WASM frontend); unknown paths get index.html for client-side routes
    let static_dir = Path::new(&config.static_dir);
    let app = routes::router(state).fallback_service(
        ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join("index.html"))),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 sai-chat server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!(
        free = config.limits.free_daily,
        guest = config.limits.guest_daily,
        "Daily message limits"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
