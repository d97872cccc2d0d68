//! HTTP Routes

mod admin;
mod auth;
mod billing;
mod chat;
mod guest;


use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub llm_connected: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.assistant.completion_provider();
    let llm_connected = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.name().to_string(),
        llm_connected,
    })
}

/// API router; static files are attached by the caller
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        // Guests
        .route("/api/guest-usage", get(guest::usage).post(guest::increment))
        // Chats
        .route("/api/chats", get(chat::list).post(chat::create))
        .route(
            "/api/chats/{id}",
            get(chat::get).patch(chat::rename).delete(chat::remove),
        )
        .route("/api/chats/{id}/messages", post(chat::send))
        // Billing
        .route("/api/plans", get(billing::plans))
        .route("/api/payments", post(billing::create_payment))
        .route("/api/payments/{token}", get(billing::payment_details))
        .route("/api/payments/{token}/complete", post(billing::complete_payment))
        .route("/api/subscription/cancel", post(billing::cancel_subscription))
        // Admin
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/users/{id}/plan", put(admin::set_plan))
        .route("/api/admin/users/{id}/toggle-plan", post(admin::toggle_plan))
        .route("/api/admin/users/{id}/reset-usage", post(admin::reset_usage))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
