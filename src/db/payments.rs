use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::billing::models::{PaymentIntent, PlanCatalogEntry};

const INTENT_COLUMNS: &str =
    "id, user_id, plan_type, amount_cents, currency, status, created_at, verified_at";

pub async fn insert_intent<'c, E>(
    executor: E,
    user_id: Uuid,
    plan: &PlanCatalogEntry,
    now: DateTime<Utc>,
) -> Result<PaymentIntent, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, PaymentIntent>(&format!(
        r#"
        INSERT INTO payment_intents (id, user_id, plan_type, amount_cents, currency, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)
        RETURNING {INTENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(plan.plan_type)
    .bind(plan.amount_cents)
    .bind(plan.currency)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn fetch_intent<'c, E>(
    executor: E,
    intent_id: Uuid,
) -> Result<Option<PaymentIntent>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, PaymentIntent>(&format!(
        "SELECT {INTENT_COLUMNS} FROM payment_intents WHERE id = ?1"
    ))
    .bind(intent_id)
    .fetch_optional(executor)
    .await
}

/// pending -> completed, or completed again when `force` is set. `None` when the intent is
/// missing or already completed without `force`.
///
/// This is a write, so running it first in a transaction takes the store's write lock up
/// front and concurrent verifications queue instead of failing a lock upgrade.
pub async fn complete_intent<'c, E>(
    executor: E,
    intent_id: Uuid,
    force: bool,
    now: DateTime<Utc>,
) -> Result<Option<PaymentIntent>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, PaymentIntent>(&format!(
        r#"
        UPDATE payment_intents
        SET status = 'completed', verified_at = ?1
        WHERE id = ?2 AND (status = 'pending' OR ?3)
        RETURNING {INTENT_COLUMNS}
        "#
    ))
    .bind(now)
    .bind(intent_id)
    .bind(force)
    .fetch_optional(executor)
    .await
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<PaymentIntent>, sqlx::Error> {
    sqlx::query_as::<_, PaymentIntent>(&format!(
        "SELECT {INTENT_COLUMNS} FROM payment_intents WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
