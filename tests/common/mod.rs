#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use arx_backend::billing::{SharedSecretAuthorizer, SubscriptionLedger};
use arx_backend::db::{self, users, users::UserRecord};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const ADMIN_KEY: &str = "operator-secret";

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");
    pool
}

/// File-backed store with several connections, for tests that race writers against each other.
pub async fn file_pool() -> (SqlitePool, PathBuf) {
    let path = std::env::temp_dir().join(format!("arx-test-{}.db", Uuid::new_v4()));
    let pool = db::connect(&format!("sqlite://{}", path.display()))
        .await
        .expect("file pool");
    db::run_migrations(&pool).await.expect("migrations");
    (pool, path)
}

pub async fn drop_file_pool(pool: SqlitePool, path: PathBuf) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

pub async fn seed_user(pool: &SqlitePool, email: &str) -> UserRecord {
    users::insert_user(pool, email, Some("Test User"), "not-a-real-hash", Utc::now())
        .await
        .expect("insert user")
}

pub fn ledger(pool: &SqlitePool) -> SubscriptionLedger {
    SubscriptionLedger::new(
        pool.clone(),
        Arc::new(SharedSecretAuthorizer::new(Some(ADMIN_KEY.to_string()))),
    )
    .with_operator_handle("arx-owner")
}

pub fn lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("x{i} = {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
