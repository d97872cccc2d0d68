//! Request Identity
//!
//! Extractors that turn a request into the caller the handlers act for: a
//! signed-in user (bearer token), an admin, or an anonymous guest keyed by
//! client address.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use chat_accounts::UserRecord;
use chat_core::{ChatOwner, Tier};

use crate::error::ApiError;
use crate::state::AppState;

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Client key for guests.
///
/// Forwarded headers are client-controlled, so they are read only when the
/// server is configured to sit behind a trusted proxy. Otherwise the socket
/// peer is the key.
pub fn guest_key(parts: &Parts, trust_proxy: bool) -> String {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(String::from)
    };

    let forwarded = if trust_proxy {
        header("x-forwarded-for").or_else(|| header("x-real-ip"))
    } else {
        None
    };

    forwarded
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "127.0.0.1".into())
}

/// Resolve a bearer token to its user record.
///
/// A token whose record has disappeared is revoked on the spot and its chats
/// dropped, so a half-valid session never lingers.
pub fn resolve_session(state: &AppState, token: &str) -> Result<UserRecord, ApiError> {
    let uid = state
        .sessions
        .resolve(token)
        .map_err(|_| ApiError::unauthorized())?;

    match state.users.get(&uid) {
        Ok(Some(record)) => Ok(record),
        Ok(None) => {
            tracing::warn!(uid = %uid, "Session without user record - signing out");
            sign_out(state, token);
            Err(ApiError::unauthorized())
        }
        Err(e) => {
            tracing::error!(uid = %uid, error = %e, "User record unreadable - signing out");
            sign_out(state, token);
            Err(ApiError::unauthorized())
        }
    }
}

/// Revoke a session and forget its chats
pub fn sign_out(state: &AppState, token: &str) {
    state.sessions.revoke(token);
    state.chats.drop_owner(&ChatOwner::Session(token.to_string()));
}

/// A signed-in caller
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub token: String,
    pub record: UserRecord,
}

impl CurrentUser {
    pub fn owner(&self) -> ChatOwner {
        ChatOwner::Session(self.token.clone())
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let record = resolve_session(state, &token)?;
        Ok(Self { token, record })
    }
}

/// A signed-in caller with the admin flag
#[derive(Clone, Debug)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.record.is_admin {
            tracing::warn!(uid = %user.record.id, "Non-admin tried an admin route");
            return Err(ApiError::forbidden("You don't have access to this page."));
        }
        Ok(Self(user))
    }
}

/// Whoever is sending: a signed-in user or a guest
#[derive(Clone, Debug)]
pub enum Caller {
    User(CurrentUser),
    Guest(String),
}

impl Caller {
    pub fn owner(&self) -> ChatOwner {
        match self {
            Self::User(user) => user.owner(),
            Self::Guest(key) => ChatOwner::Guest(key.clone()),
        }
    }

    pub const fn tier(&self) -> Tier {
        match self {
            Self::User(user) => user.record.tier(),
            Self::Guest(_) => Tier::Guest,
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    /// A bearer token that fails to resolve is an error, not a silent guest
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(_) => Ok(Self::User(CurrentUser::from_request_parts(parts, state).await?)),
            None => Ok(Self::Guest(guest_key(parts, state.config.trust_proxy))),
        }
    }
}

/// Guest key for the guest-usage endpoints
#[derive(Clone, Debug)]
pub struct GuestKey(pub String);

impl FromRequestParts<AppState> for GuestKey {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(guest_key(parts, state.config.trust_proxy)))
    }
}
