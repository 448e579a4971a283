use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{PlanType, Role, Subscription};
use crate::db::{subscriptions, users};
use crate::error::{AppError, AppResult};

/// key: billing-entitlement -> derived access tier
#[derive(Debug, Clone, Serialize)]
pub struct Entitlement {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub plan: Option<PlanType>,
    pub translations_count: i64,
    pub discord_linked: bool,
    pub subscription: Option<Subscription>,
}

impl Entitlement {
    pub fn is_premium(&self) -> bool {
        self.role == Role::Premium
    }
}

/// Read-only view over the user and subscription rows. No caching: every call reads the
/// store.
#[derive(Clone)]
pub struct EntitlementProjector {
    pool: SqlitePool,
}

impl EntitlementProjector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn project(&self, user_id: Uuid) -> AppResult<Entitlement> {
        // Both reads share one snapshot.
        let mut tx = self.pool.begin().await?;
        let user = users::fetch_user(&mut *tx, user_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;
        let subscription = subscriptions::fetch_for_user(&mut *tx, user_id).await?;
        tx.commit().await?;

        Ok(Entitlement {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            plan: user.plan,
            translations_count: user.translations_count,
            discord_linked: user.discord_user_id.is_some(),
            subscription,
        })
    }
}
