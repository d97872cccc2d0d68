//! Guest usage endpoint

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chat_accounts::GuestUsage;
use serde::{Deserialize, Serialize};

use crate::auth::GuestKey;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IncrementRequest {
    #[serde(default)]
    pub increment: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitReached {
    error: &'static str,
    code: &'static str,
    #[serde(flatten)]
    usage: GuestUsage,
}

pub async fn usage(State(state): State<AppState>, GuestKey(key): GuestKey) -> Json<GuestUsage> {
    Json(state.guests.snapshot(&key))
}

/// 200 with the new usage, or 429 once the daily limit is reached
pub async fn increment(
    State(state): State<AppState>,
    GuestKey(key): GuestKey,
    Json(payload): Json<IncrementRequest>,
) -> Response {
    if !payload.increment {
        return ApiError::bad_request("Invalid request").into_response();
    }

    match state.guests.try_increment(&key) {
        Ok(usage) => Json(usage).into_response(),
        Err(usage) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(LimitReached {
                error: "Daily limit reached",
                code: "QUOTA_EXCEEDED",
                usage,
            }),
        )
            .into_response(),
    }
}
