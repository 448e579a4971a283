use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use super::authorizer::VerificationAuthorizer;
use super::models::{
    PaymentIntent, PlanCatalogEntry, PlanType, Role, Subscription, PLAN_CATALOG,
};
use crate::db::{payments, subscriptions, users};
use crate::error::{AppError, AppResult};

/// key: billing-ledger -> payment intents + subscription lifecycle
///
/// Every transition that touches more than one row runs inside a single transaction, so
/// readers never see a completed intent without the matching subscription and user rows.
#[derive(Clone)]
pub struct SubscriptionLedger {
    pool: SqlitePool,
    authorizer: Arc<dyn VerificationAuthorizer>,
    operator_handle: String,
}

/// What the user must send out of band to unlock a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOrder {
    pub intent_id: Uuid,
    pub amount: f64,
    pub plan_name: &'static str,
    pub plan_type: PlanType,
    pub currency: String,
    pub instructions: String,
    pub contact_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub success: bool,
    pub user_id: Uuid,
    pub new_role: Role,
    pub new_plan: PlanType,
    pub intent: PaymentIntent,
    pub subscription: Subscription,
}

impl SubscriptionLedger {
    pub fn new(pool: SqlitePool, authorizer: Arc<dyn VerificationAuthorizer>) -> Self {
        Self {
            pool,
            authorizer,
            operator_handle: "owner".to_string(),
        }
    }

    /// Handle quoted in payment instructions.
    pub fn with_operator_handle(mut self, handle: impl Into<String>) -> Self {
        self.operator_handle = handle.into();
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn plan_catalog(&self) -> &'static [PlanCatalogEntry] {
        &PLAN_CATALOG
    }

    pub async fn create_payment_intent(
        &self,
        user_id: Uuid,
        plan_type: &str,
    ) -> AppResult<PaymentOrder> {
        let plan = plan_type.parse::<PlanType>()?.catalog_entry();

        if users::fetch_user(&self.pool, user_id).await?.is_none() {
            return Err(AppError::NotFound("user"));
        }

        let intent = payments::insert_intent(&self.pool, user_id, plan, Utc::now()).await?;
        info!(
            intent_id = %intent.id,
            %user_id,
            plan_type = plan.plan_type.as_str(),
            amount_cents = intent.amount_cents,
            "payment intent created"
        );

        Ok(PaymentOrder {
            intent_id: intent.id,
            amount: intent.amount(),
            plan_name: plan.name,
            plan_type: plan.plan_type,
            instructions: format!(
                "Send {:.2} {} to Discord @{} for {} and include payment ID: {}",
                intent.amount(),
                intent.currency,
                self.operator_handle,
                plan.name,
                intent.id
            ),
            contact_link: format!("https://discord.com/users/{}", self.operator_handle),
            currency: intent.currency,
        })
    }

    pub async fn verify_payment(
        &self,
        intent_id: Uuid,
        credential: Option<&str>,
        force: bool,
    ) -> AppResult<VerificationOutcome> {
        self.verify_payment_at(intent_id, credential, force, Utc::now())
            .await
    }

    /// Completes an intent and activates the owner's subscription as of `now`.
    ///
    /// A completed intent is only re-applied when `force` is set; this is the correction
    /// path for a wrongly computed horizon.
    pub async fn verify_payment_at(
        &self,
        intent_id: Uuid,
        credential: Option<&str>,
        force: bool,
        now: DateTime<Utc>,
    ) -> AppResult<VerificationOutcome> {
        if let Err(err) = self.authorizer.authorize(credential).await {
            warn!(%intent_id, "payment verification rejected: operator credential mismatch");
            return Err(err);
        }

        let mut tx = self.pool.begin().await?;

        // The status write goes first so the transaction holds the write lock before any read.
        let Some(intent) = payments::complete_intent(&mut *tx, intent_id, force, now).await? else {
            return match payments::fetch_intent(&mut *tx, intent_id).await? {
                Some(_) => Err(AppError::AlreadyVerified { intent_id }),
                None => Err(AppError::NotFound("payment intent")),
            };
        };
        let plan_type = intent.plan_type;
        let renewal_date = plan_type.renewal_date(now);

        let subscription = match subscriptions::fetch_for_user(&mut *tx, intent.user_id).await? {
            Some(existing) => {
                subscriptions::reactivate(&mut *tx, existing.id, plan_type, renewal_date, now)
                    .await?
            }
            None => {
                subscriptions::insert_active(&mut *tx, intent.user_id, plan_type, renewal_date, now)
                    .await?
            }
        };

        let updated =
            users::set_entitlement(&mut *tx, intent.user_id, Role::Premium, Some(plan_type), now)
                .await?;
        if updated == 0 {
            return Err(AppError::NotFound("user"));
        }

        tx.commit().await?;

        info!(
            %intent_id,
            user_id = %intent.user_id,
            subscription_id = %subscription.id,
            plan_type = plan_type.as_str(),
            renewal_date = ?renewal_date,
            forced = force,
            "payment verified; premium activated"
        );

        Ok(VerificationOutcome {
            success: true,
            user_id: intent.user_id,
            new_role: Role::Premium,
            new_plan: plan_type,
            intent,
            subscription,
        })
    }

    pub async fn payment_history(&self, user_id: Uuid) -> AppResult<Vec<PaymentIntent>> {
        Ok(payments::list_for_user(&self.pool, user_id).await?)
    }

    pub async fn cancel_subscription(&self, user_id: Uuid) -> AppResult<Subscription> {
        self.cancel_subscription_at(user_id, Utc::now()).await
    }

    /// Stops renewal. Access lasts until the paid horizon; a plan without a horizon (or one
    /// that has already passed it) is downgraded immediately.
    pub async fn cancel_subscription_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let mut tx = self.pool.begin().await?;

        let Some(cancelled) = subscriptions::cancel_active_for_user(&mut *tx, user_id, now).await?
        else {
            // Already cancelled is a no-op; no row at all is an error.
            return subscriptions::fetch_for_user(&mut *tx, user_id)
                .await?
                .ok_or(AppError::NotFound("subscription"));
        };

        let downgrade =
            cancelled.plan_type == PlanType::Permanent || cancelled.has_lapsed(now);
        if downgrade {
            users::set_entitlement(&mut *tx, user_id, Role::Free, None, now).await?;
        }

        tx.commit().await?;

        info!(
            %user_id,
            subscription_id = %cancelled.id,
            plan_type = cancelled.plan_type.as_str(),
            downgraded = downgrade,
            "subscription cancelled"
        );
        Ok(cancelled)
    }

    /// Downgrades every premium user whose paid horizon ended at or before `now`.
    /// Returns how many users were downgraded.
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let candidates = subscriptions::list_lapse_candidates(&self.pool).await?;
        let mut downgraded = 0;

        for candidate in candidates.into_iter().filter(|sub| sub.has_lapsed(now)) {
            let Some(renewal_date) = candidate.renewal_date else {
                continue;
            };
            let mut tx = self.pool.begin().await?;
            // A verification that extended the horizon since the scan turns this into a no-op.
            let Some(current) =
                subscriptions::expire_if_unchanged(&mut *tx, candidate.id, renewal_date, now)
                    .await?
            else {
                continue;
            };
            users::set_entitlement(&mut *tx, current.user_id, Role::Free, None, now).await?;
            tx.commit().await?;

            info!(
                user_id = %current.user_id,
                subscription_id = %current.id,
                renewal_date = ?current.renewal_date,
                "subscription lapsed; user downgraded to free"
            );
            downgraded += 1;
        }

        Ok(downgraded)
    }
}
