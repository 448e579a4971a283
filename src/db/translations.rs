use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

// key: translations-db -> append-only history
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TranslationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_lang: String,
    pub target_lang: String,
    pub source_code: String,
    pub output_code: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewTranslation<'a> {
    pub user_id: Uuid,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub source_code: &'a str,
    pub output_code: &'a str,
    pub provider: &'a str,
}

pub async fn insert_translation<'c, E>(
    executor: E,
    record: &NewTranslation<'_>,
    now: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO translations (id, user_id, source_lang, target_lang, source_code, output_code, provider, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(id)
    .bind(record.user_id)
    .bind(record.source_lang)
    .bind(record.target_lang)
    .bind(record.source_code)
    .bind(record.output_code)
    .bind(record.provider)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<TranslationRecord>, sqlx::Error> {
    sqlx::query_as::<_, TranslationRecord>(
        r#"
        SELECT id, user_id, source_lang, target_lang, source_code, output_code, provider, created_at
        FROM translations
        WHERE user_id = ?1
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM translations WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
