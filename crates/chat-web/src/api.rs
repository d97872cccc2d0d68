//! API Client
//!
//! Typed calls to the chat server. The bearer token lives in local storage so
//! a reload keeps the session.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

const TOKEN_KEY: &str = "sai_token";
const GUEST_USAGE_KEY: &str = "sai_guest_usage";

/// Guest limit assumed when the server cannot be asked
const FALLBACK_GUEST_LIMIT: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub name: String,
    pub plan: String,
    pub daily_usage: u32,
    pub subscription_status: String,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub is_admin: bool,
}

impl User {
    pub fn is_pro(&self) -> bool {
        self.plan == "pro"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
    pub tier: Tier,
    pub allowed: bool,
    pub used: u32,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub remaining: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Guest,
    Free,
    Pro,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestUsage {
    pub used: u32,
    pub limit: u32,
    pub can_send: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub quota: Quota,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Me {
    pub user: User,
    pub quota: Quota,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub user_message: Message,
    pub assistant_message: Message,
    pub quota: Quota,
    pub degraded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    pub price: String,
    pub currency: String,
    pub period: String,
    #[serde(default)]
    pub original_price: Option<String>,
    #[serde(default)]
    pub discount: Option<String>,
    pub features: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub token: String,
    pub payment_page_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PaymentDetails {
    pub token: String,
    pub plan: SubscriptionPlan,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardForm {
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvc: String,
    pub card_holder_name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompleted {
    pub success: bool,
    pub subscription_id: String,
    pub user: User,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub pro_users: usize,
    pub free_users: usize,
}

/// Error body returned by the server
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
    #[serde(default)]
    pub code: String,
}

impl ApiError {
    fn network(e: impl std::fmt::Display) -> Self {
        Self {
            status: 0,
            error: format!("Could not reach the server: {e}"),
            code: "NETWORK".into(),
        }
    }

    pub fn is_quota(&self) -> bool {
        self.status == 429
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into())
}

pub fn stored_token() -> Option<String> {
    storage().and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
}

pub fn store_token(token: Option<&str>) {
    if let Some(storage) = storage() {
        let _ = match token {
            Some(token) => storage.set_item(TOKEN_KEY, token),
            None => storage.remove_item(TOKEN_KEY),
        };
    }
}

fn builder(method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
    let builder = reqwest::Client::new().request(method, format!("{}{path}", origin()));
    match stored_token() {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

async fn send<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> ApiResult<T> {
    let response = builder.send().await.map_err(ApiError::network)?;
    let status = response.status();

    if status.is_success() {
        if status == reqwest::StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(ApiError::network);
        }
        response.json().await.map_err(ApiError::network)
    } else {
        let mut error: ApiError = response.json().await.unwrap_or_else(|_| ApiError {
            status: 0,
            error: "Request failed".into(),
            code: String::new(),
        });
        error.status = status.as_u16();
        Err(error)
    }
}

async fn request<T: DeserializeOwned>(
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
) -> ApiResult<T> {
    let builder = builder(method, path);
    match body {
        Some(body) => send(builder.json(&body)).await,
        None => send(builder).await,
    }
}

async fn get<T: DeserializeOwned>(path: &str) -> ApiResult<T> {
    request(reqwest::Method::GET, path, None).await
}

async fn post<T: DeserializeOwned>(path: &str, body: serde_json::Value) -> ApiResult<T> {
    request(reqwest::Method::POST, path, Some(body)).await
}

// Auth

pub async fn register(email: &str, password: &str, name: &str) -> ApiResult<AuthResponse> {
    let auth: AuthResponse = post(
        "/api/auth/register",
        json!({ "email": email, "password": password, "name": name }),
    )
    .await?;
    store_token(Some(&auth.token));
    Ok(auth)
}

pub async fn login(email: &str, password: &str) -> ApiResult<AuthResponse> {
    let auth: AuthResponse = post(
        "/api/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await?;
    store_token(Some(&auth.token));
    Ok(auth)
}

pub async fn logout() {
    let _: ApiResult<()> = request(reqwest::Method::POST, "/api/auth/logout", None).await;
    store_token(None);
}

/// Current account; a rejected token is forgotten
pub async fn me() -> ApiResult<Me> {
    let result = get("/api/me").await;
    if let Err(e) = &result {
        if e.is_unauthorized() {
            store_token(None);
        }
    }
    result
}

// Guests

#[derive(Serialize, Deserialize)]
struct LocalGuestUsage {
    date: NaiveDate,
    used: u32,
}

/// Last known guest usage kept in the browser, for when the server is unreachable
fn local_guest_usage(limit: u32) -> GuestUsage {
    let today = Local::now().date_naive();
    let used = storage()
        .and_then(|s| s.get_item(GUEST_USAGE_KEY).ok().flatten())
        .and_then(|raw| serde_json::from_str::<LocalGuestUsage>(&raw).ok())
        .filter(|record| record.date == today)
        .map_or(0, |record| record.used);

    GuestUsage {
        used,
        limit,
        can_send: used < limit,
    }
}

pub fn remember_guest_usage(used: u32) {
    let record = LocalGuestUsage {
        date: Local::now().date_naive(),
        used,
    };
    if let (Some(storage), Ok(raw)) = (storage(), serde_json::to_string(&record)) {
        let _ = storage.set_item(GUEST_USAGE_KEY, &raw);
    }
}

pub async fn guest_usage() -> GuestUsage {
    match get::<GuestUsage>("/api/guest-usage").await {
        Ok(usage) => {
            remember_guest_usage(usage.used);
            usage
        }
        Err(e) => {
            leptos::logging::warn!("guest usage unavailable, using local record: {e}");
            local_guest_usage(FALLBACK_GUEST_LIMIT)
        }
    }
}

// Chats

pub async fn list_chats() -> ApiResult<Vec<Chat>> {
    get("/api/chats").await
}

pub async fn create_chat() -> ApiResult<Chat> {
    post("/api/chats", json!({})).await
}

pub async fn rename_chat(id: &str, title: &str) -> ApiResult<Chat> {
    request(
        reqwest::Method::PATCH,
        &format!("/api/chats/{id}"),
        Some(json!({ "title": title })),
    )
    .await
}

pub async fn delete_chat(id: &str) -> ApiResult<()> {
    request(reqwest::Method::DELETE, &format!("/api/chats/{id}"), None).await
}

pub async fn send_message(chat_id: &str, content: &str, image: bool) -> ApiResult<SendResponse> {
    post(
        &format!("/api/chats/{chat_id}/messages"),
        json!({ "content": content, "image": image }),
    )
    .await
}

// Billing

pub async fn plans() -> ApiResult<Vec<SubscriptionPlan>> {
    get("/api/plans").await
}

pub async fn create_payment(plan_id: &str) -> ApiResult<PaymentSession> {
    post("/api/payments", json!({ "planId": plan_id })).await
}

pub async fn payment_details(token: &str) -> ApiResult<PaymentDetails> {
    get(&format!("/api/payments/{token}")).await
}

pub async fn complete_payment(token: &str, card: &CardForm) -> ApiResult<PaymentCompleted> {
    let body = serde_json::to_value(card).map_err(ApiError::network)?;
    post(&format!("/api/payments/{token}/complete"), body).await
}

pub async fn cancel_subscription() -> ApiResult<User> {
    post("/api/subscription/cancel", json!({})).await
}

// Admin

/// Query pairs for the user list; an empty plan means every plan
fn admin_user_query<'a>(plan: &'a str, search: &'a str) -> [(&'static str, &'a str); 2] {
    let plan = if plan.is_empty() { "all" } else { plan };
    [("plan", plan), ("search", search.trim())]
}

pub async fn admin_users(plan: &str, search: &str) -> ApiResult<Vec<User>> {
    let query = admin_user_query(plan, search);
    send(builder(reqwest::Method::GET, "/api/admin/users").query(&query)).await
}

pub async fn admin_stats() -> ApiResult<UserStats> {
    get("/api/admin/stats").await
}

pub async fn admin_toggle_plan(uid: &str) -> ApiResult<User> {
    post(&format!("/api/admin/users/{uid}/toggle-plan"), json!({})).await
}

pub async fn admin_delete_user(uid: &str) -> ApiResult<()> {
    request(reqwest::Method::DELETE, &format!("/api/admin/users/{uid}"), None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_url(plan: &str, search: &str) -> String {
        reqwest::Client::new()
            .get("http://localhost/api/admin/users")
            .query(&admin_user_query(plan, search))
            .build()
            .unwrap()
            .url()
            .to_string()
    }

    #[test]
    fn test_admin_search_keeps_spaces_and_symbols() {
        assert_eq!(
            admin_url("", " Ada Lovelace "),
            "http://localhost/api/admin/users?plan=all&search=Ada+Lovelace"
        );
        assert_eq!(
            admin_url("pro", "o'brien&co"),
            "http://localhost/api/admin/users?plan=pro&search=o%27brien%26co"
        );
    }
}
