use arx_backend::billing::{self, SharedSecretAuthorizer, SubscriptionLedger};
use arx_backend::providers::ProviderRouter;
use arx_backend::quota::QuotaGate;
use arx_backend::{config, db, AppServices};
use axum::{routing::get, Router};
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    // Fail fast if the JWT secret is missing
    let _ = config::JWT_SECRET.as_str();

    let pool = db::connect(config::DATABASE_URL.as_str()).await?;
    if let Err(error) = db::run_migrations(&pool).await {
        if *config::ALLOW_MIGRATION_FAILURE {
            tracing::warn!(
                ?error,
                "Database migrations failed but continuing due to ALLOW_MIGRATION_FAILURE"
            );
        } else {
            return Err(Box::new(error) as Box<dyn std::error::Error>);
        }
    }

    // Refuse to start with a provider that cannot serve requests.
    let router = Arc::new(ProviderRouter::from_settings(
        &config::provider_settings_from_env(),
    )?);

    if config::ADMIN_KEY.is_none() {
        tracing::warn!("ADMIN_KEY is not set; payment verification is disabled");
    }
    let authorizer = Arc::new(SharedSecretAuthorizer::new(config::ADMIN_KEY.clone()));
    let ledger = SubscriptionLedger::new(pool.clone(), authorizer)
        .with_operator_handle(config::DISCORD_OWNER_ID.as_str());
    billing::spawn_lapse_scheduler(
        ledger.clone(),
        Duration::from_secs(*config::BILLING_RENEWAL_SCAN_INTERVAL_SECS),
    );

    let services = AppServices::new(pool, ledger, router, QuotaGate::from_config());
    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();
    let app = Router::new()
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        )
        .merge(services.into_router())
        .layer(prometheus_layer);

    let addr: SocketAddr = format!("{}:{}", config::BIND_ADDRESS.as_str(), *config::BIND_PORT)
        .parse()
        .map_err(|error| Box::new(error) as Box<dyn std::error::Error>)?;
    tracing::info!(%addr, "Listening for incoming connections");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
