//! Admin user management

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chat_accounts::{UserFilter, UserRecord, UserStats};
use chat_billing::Plan;
use chat_core::ChatOwner;
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// `free`, `pro`, or `all`/absent for everyone
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl UserQuery {
    fn into_filter(self) -> ApiResult<UserFilter> {
        let plan = self
            .plan
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("all"))
            .map(|p| {
                p.parse::<Plan>()
                    .map_err(|_| ApiError::bad_request(format!("Unknown plan filter: {p}")))
            })
            .transpose()?;

        Ok(UserFilter {
            plan,
            search: self.search,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SetPlanRequest {
    pub plan: Plan,
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<UserRecord>>> {
    Ok(Json(state.admin.list_users(&query.into_filter()?)?))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<UserStats>> {
    Ok(Json(state.admin.stats()?))
}

pub async fn set_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<SetPlanRequest>,
) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.admin.set_plan(&id, payload.plan)?))
}

pub async fn toggle_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.admin.toggle_plan(&id)?))
}

pub async fn reset_usage(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.admin.reset_usage(&id)?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let deleted = state.admin.delete_user(&id).await?;
    for token in deleted.revoked_sessions {
        state.chats.drop_owner(&ChatOwner::Session(token));
    }

    tracing::info!(admin = %admin.record.id, uid = %id, "User removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_to_filter() {
        let all = UserQuery {
            plan: Some("all".into()),
            search: None,
        }
        .into_filter()
        .unwrap();
        assert!(all.plan.is_none());

        let pro = UserQuery {
            plan: Some("pro".into()),
            search: Some("ada".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(pro.plan, Some(Plan::Pro));
        assert_eq!(pro.search.as_deref(), Some("ada"));

        assert!(UserQuery::default().into_filter().unwrap().plan.is_none());
    }

    #[test]
    fn test_unknown_plan_filter_is_rejected() {
        let query = UserQuery {
            plan: Some("platinum".into()),
            search: None,
        };
        assert!(query.into_filter().is_err());
    }
}
