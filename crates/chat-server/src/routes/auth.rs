//! Sign-up, sign-in and the current account

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chat_accounts::{Identity, UserRecord};
use chat_core::QuotaDecision;
use serde::{Deserialize, Serialize};

use crate::auth::{self as session, CurrentUser};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserRecord,
    pub quota: QuotaDecision,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserRecord,
    pub quota: QuotaDecision,
}

fn start_session(state: &AppState, identity: &Identity) -> ApiResult<AuthResponse> {
    let is_admin = state.config.is_admin_email(identity.email.as_deref());
    let user = state.users.ensure(identity, is_admin)?;
    let token = state.sessions.issue(&user.id);
    let quota = state.gate.check(user.tier(), user.daily_usage);

    Ok(AuthResponse { token, user, quota })
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let identity = state
        .identities
        .sign_up(&payload.email, &payload.password, payload.name.as_deref())
        .await?;

    let response = start_session(&state, &identity)?;
    tracing::info!(uid = %response.user.id, "User registered");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let identity = state
        .identities
        .sign_in(&payload.email, &payload.password)
        .await?;

    let response = start_session(&state, &identity)?;
    tracing::info!(uid = %response.user.id, plan = %response.user.plan, "User signed in");
    Ok(Json(response))
}

/// Idempotent: an unknown or missing token still signs out
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = session::bearer_token(&headers) {
        session::sign_out(&state, &token);
    }
    StatusCode::NO_CONTENT
}

pub async fn me(State(state): State<AppState>, user: CurrentUser) -> Json<MeResponse> {
    let quota = state.gate.check(user.record.tier(), user.record.daily_usage);
    Json(MeResponse {
        user: user.record,
        quota,
    })
}
