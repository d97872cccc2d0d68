//! Plans, payments and subscriptions

use axum::{
    Json,
    extract::{Path, State},
};
use chat_accounts::UserRecord;
use chat_billing::{
    BillingError, CardDetails, Plan, PaymentRequest, PaymentSession, SubscriptionPlan, catalog,
    find_plan,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub token: String,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompleted {
    pub success: bool,
    pub subscription_id: String,
    pub user: UserRecord,
}

pub async fn plans() -> Json<Vec<SubscriptionPlan>> {
    Json(catalog())
}

pub async fn create_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> ApiResult<Json<PaymentSession>> {
    let plan = find_plan(&payload.plan_id)
        .ok_or_else(|| BillingError::UnknownPlan(payload.plan_id.clone()))?;

    let session = state
        .gateway
        .create_payment_request(PaymentRequest {
            plan_id: plan.id,
            user_id: user.record.id,
            amount: plan.price,
            currency: plan.currency,
            callback_url: format!("{}/success", state.config.public_url),
        })
        .await?;

    Ok(Json(session))
}

/// What a pending payment token is for; only its owner may look
pub async fn payment_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(token): Path<String>,
) -> ApiResult<Json<PaymentDetails>> {
    let plan = pending_plan(&state, &user, &token)?;
    Ok(Json(PaymentDetails { token, plan }))
}

fn pending_plan(state: &AppState, user: &CurrentUser, token: &str) -> ApiResult<SubscriptionPlan> {
    let request = state
        .gateway
        .pending(token)
        .filter(|request| request.user_id == user.record.id)
        .ok_or_else(|| BillingError::TokenNotFound(token.to_string()))?;

    find_plan(&request.plan_id)
        .ok_or_else(|| BillingError::UnknownPlan(request.plan_id.clone()).into())
}

/// Charge the card, check the gateway's receipt, then upgrade
pub async fn complete_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(token): Path<String>,
    Json(card): Json<CardDetails>,
) -> ApiResult<Json<PaymentCompleted>> {
    let plan = pending_plan(&state, &user, &token)?;

    let outcome = state.gateway.process_payment(&token, &card).await?;
    let receipt = outcome
        .receipt
        .filter(|_| outcome.success)
        .ok_or_else(|| BillingError::Gateway("payment declined".into()))?;

    state.signer.verify(&receipt)?;
    if receipt.user_id != user.record.id || receipt.plan_id != plan.id {
        return Err(BillingError::SignatureInvalid("receipt does not match payment".into()).into());
    }

    let record = state.users.set_plan(
        &user.record.id,
        Plan::Pro,
        plan.period,
        Some(receipt.subscription_id.clone()),
    )?;

    tracing::info!(
        uid = %record.id,
        plan = %plan.id,
        subscription_id = %receipt.subscription_id,
        "Subscription activated"
    );

    Ok(Json(PaymentCompleted {
        success: true,
        subscription_id: receipt.subscription_id,
        user: record,
    }))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<UserRecord>> {
    if user.record.plan != Plan::Pro {
        return Err(ApiError::bad_request("There is no active subscription to cancel."));
    }

    if let Some(subscription_id) = &user.record.subscription_id {
        state.gateway.cancel_subscription(subscription_id).await?;
    }

    let record = state.users.cancel_subscription(&user.record.id)?;
    tracing::info!(uid = %record.id, until = ?record.subscription_end_date, "Subscription cancelled");
    Ok(Json(record))
}
