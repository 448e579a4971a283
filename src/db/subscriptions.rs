use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::billing::models::{PlanType, Subscription};

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan_type, status, renewal_date, cancelled_at, created_at, updated_at";

pub async fn fetch_for_user<'c, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_active<'c, E>(
    executor: E,
    user_id: Uuid,
    plan_type: PlanType,
    renewal_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Subscription, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        INSERT INTO subscriptions (id, user_id, plan_type, status, renewal_date, cancelled_at, created_at, updated_at)
        VALUES (?1, ?2, ?3, 'active', ?4, NULL, ?5, ?5)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(plan_type)
    .bind(renewal_date)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Overwrites plan, status and horizon of an existing row and clears `cancelled_at`.
pub async fn reactivate<'c, E>(
    executor: E,
    subscription_id: Uuid,
    plan_type: PlanType,
    renewal_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Subscription, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        UPDATE subscriptions
        SET plan_type = ?1, status = 'active', renewal_date = ?2, cancelled_at = NULL, updated_at = ?3
        WHERE id = ?4
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(plan_type)
    .bind(renewal_date)
    .bind(now)
    .bind(subscription_id)
    .fetch_one(executor)
    .await
}

/// active -> cancelled for the user's subscription. `None` when there is no active row.
pub async fn cancel_active_for_user<'c, E>(
    executor: E,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        UPDATE subscriptions
        SET status = 'cancelled', cancelled_at = ?1, updated_at = ?1
        WHERE user_id = ?2 AND status = 'active'
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(now)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Cancels the row only if its horizon is still `observed_renewal`; a verification that
/// moved the horizon in the meantime makes this a no-op returning `None`.
pub async fn expire_if_unchanged<'c, E>(
    executor: E,
    subscription_id: Uuid,
    observed_renewal: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        UPDATE subscriptions
        SET status = 'cancelled', cancelled_at = COALESCE(cancelled_at, ?1), updated_at = ?1
        WHERE id = ?2 AND renewal_date = ?3
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(now)
    .bind(subscription_id)
    .bind(observed_renewal)
    .fetch_optional(executor)
    .await
}

/// Subscriptions with a finite horizon whose owner still holds premium access.
pub async fn list_lapse_candidates(pool: &SqlitePool) -> Result<Vec<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        r#"
        SELECT s.id, s.user_id, s.plan_type, s.status, s.renewal_date, s.cancelled_at, s.created_at, s.updated_at
        FROM subscriptions s
        JOIN users u ON u.id = s.user_id
        WHERE s.renewal_date IS NOT NULL AND u.role = 'premium'
        "#,
    )
    .fetch_all(pool)
    .await
}
