//! Session chats

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chat_core::{Chat, ChatId};
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::service::{ChatService, SendRequest, SendResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

pub async fn list(State(state): State<AppState>, caller: Caller) -> Json<Vec<Chat>> {
    Json(state.chats.list(&caller.owner()))
}

pub async fn create(State(state): State<AppState>, caller: Caller) -> (StatusCode, Json<Chat>) {
    let chat = state.chats.create(&caller.owner());
    tracing::debug!(chat = %chat.id, "Chat created");
    (StatusCode::CREATED, Json(chat))
}

pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Chat>> {
    let chat = state.chats.get(&caller.owner(), &ChatId::from_string(id))?;
    Ok(Json(chat))
}

pub async fn rename(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> ApiResult<Json<Chat>> {
    let chat = state
        .chats
        .rename(&caller.owner(), &ChatId::from_string(id), &payload.title)?;
    Ok(Json(chat))
}

pub async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.chats.delete(&caller.owner(), &ChatId::from_string(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<SendRequest>,
) -> ApiResult<Json<SendResponse>> {
    let response = ChatService::new(&state)
        .send(&caller, &ChatId::from_string(id), payload)
        .await?;
    Ok(Json(response))
}
