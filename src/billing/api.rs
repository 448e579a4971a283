use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::{PaymentOrder, SubscriptionLedger, VerificationOutcome};
use super::models::{PaymentIntent, PlanType, Subscription};
use crate::error::AppResult;
use crate::extractor::{AdminCredential, AuthUser};

/// key: billing-api -> rest endpoints
pub async fn list_plans(Extension(ledger): Extension<SubscriptionLedger>) -> Json<Vec<PlanOffer>> {
    let offers = ledger
        .plan_catalog()
        .iter()
        .map(|entry| PlanOffer {
            plan_type: entry.plan_type,
            name: entry.name,
            amount: entry.amount(),
            currency: entry.currency,
            renewal_days: entry.renewal_days,
        })
        .collect();
    Json(offers)
}

pub async fn create_order(
    Extension(ledger): Extension<SubscriptionLedger>,
    AuthUser { user_id, .. }: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<PaymentOrder>)> {
    let order = ledger
        .create_payment_intent(user_id, payload.plan_type.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Operator endpoint; the credential travels in the `x-admin-key` header.
pub async fn verify_payment(
    Extension(ledger): Extension<SubscriptionLedger>,
    AdminCredential(credential): AdminCredential,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<VerificationOutcome>> {
    let outcome = ledger
        .verify_payment(payload.intent_id, credential.as_deref(), payload.force)
        .await?;
    Ok(Json(outcome))
}

pub async fn payment_history(
    Extension(ledger): Extension<SubscriptionLedger>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Vec<PaymentIntent>>> {
    Ok(Json(ledger.payment_history(user_id).await?))
}

pub async fn cancel_subscription(
    Extension(ledger): Extension<SubscriptionLedger>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Subscription>> {
    Ok(Json(ledger.cancel_subscription(user_id).await?))
}

#[derive(Debug, Serialize)]
pub struct PlanOffer {
    pub plan_type: PlanType,
    pub name: &'static str,
    pub amount: f64,
    pub currency: &'static str,
    pub renewal_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(alias = "planType")]
    pub plan_type: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "intentId", alias = "paymentId")]
    pub intent_id: Uuid,
    #[serde(default)]
    pub force: bool,
}
