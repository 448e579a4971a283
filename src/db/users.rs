use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::billing::models::{PlanType, Role};

// key: users-db -> identity + entitlement columns
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub plan: Option<PlanType>,
    pub discord_user_id: Option<String>,
    pub translations_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role, plan, discord_user_id, \
    translations_count, created_at, updated_at";

pub async fn insert_user<'c, E>(
    executor: E,
    email: &str,
    name: Option<&str>,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<UserRecord, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    sqlx::query_as::<_, UserRecord>(&format!(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, plan, translations_count, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 'free', NULL, 0, ?5, ?5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn fetch_user<'c, E>(executor: E, user_id: Uuid) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn fetch_user_by_email<'c, E>(
    executor: E,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await
}

/// Writes the entitlement columns. Only ledger transitions call this.
pub async fn set_entitlement<'c, E>(
    executor: E,
    user_id: Uuid,
    role: Role,
    plan: Option<PlanType>,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE users SET role = ?1, plan = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(role)
        .bind(plan)
        .bind(now)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn increment_translations<'c, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result =
        sqlx::query("UPDATE users SET translations_count = translations_count + 1 WHERE id = ?1")
            .bind(user_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

pub async fn set_discord_user_id<'c, E>(
    executor: E,
    user_id: Uuid,
    discord_user_id: &str,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result =
        sqlx::query("UPDATE users SET discord_user_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(discord_user_id)
            .bind(now)
            .bind(user_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete_user<'c, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
