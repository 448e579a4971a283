use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::billing::{EntitlementProjector, SubscriptionLedger};
use crate::providers::ProviderRouter;
use crate::quota::QuotaGate;
use crate::translations::TranslationService;
use crate::{auth, billing, discord, translations};

pub async fn root() -> &'static str {
    "Arx Translation API"
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub fn api_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register_user))
        .route("/api/auth/login", post(auth::login_user))
        .route("/api/auth/logout", post(auth::logout_user))
        .route("/api/auth/me", get(auth::current_user))
        .route("/api/payments/plans", get(billing::api::list_plans))
        .route("/api/payments/create-order", post(billing::api::create_order))
        .route("/api/payments/verify", post(billing::api::verify_payment))
        .route("/api/payments/history", get(billing::api::payment_history))
        .route("/api/payments/cancel", post(billing::api::cancel_subscription))
        .route("/api/translations/translate", post(translations::translate))
        .route("/api/translations/history", get(translations::history))
        .route("/api/translations/explain", post(translations::explain))
        .route("/api/translations/optimize", post(translations::optimize))
        .route("/api/discord/link", post(discord::link_discord))
        .route("/api/discord/info", get(discord::discord_info))
}

/// Shared handles every handler may extract.
#[derive(Clone)]
pub struct AppServices {
    pub pool: SqlitePool,
    pub ledger: SubscriptionLedger,
    pub projector: EntitlementProjector,
    pub translations: TranslationService,
}

impl AppServices {
    pub fn new(
        pool: SqlitePool,
        ledger: SubscriptionLedger,
        router: Arc<ProviderRouter>,
        gate: QuotaGate,
    ) -> Self {
        let projector = EntitlementProjector::new(pool.clone());
        let translations =
            TranslationService::new(pool.clone(), router, gate, projector.clone());
        Self {
            pool,
            ledger,
            projector,
            translations,
        }
    }

    /// Root banner plus every API route, with the service layers applied.
    pub fn into_router(self) -> Router {
        Router::new()
            .route("/", get(root))
            .merge(api_routes())
            .layer(Extension(self.pool))
            .layer(Extension(self.ledger))
            .layer(Extension(self.projector))
            .layer(Extension(self.translations))
    }
}
