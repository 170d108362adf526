use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use spaceout_api::{app, payments::ReceiptVerifier, state::{AppState, AuthConfig, RateLimit, Services}, worker};
use spaceout_core::{BudgetRepository, LaunchWindowRepository};
use spaceout_ledger::{InMemoryBudgetRepository, InMemoryLaunchWindowRepository};
use spaceout_store::{Config, DbClient, PostgresBudgetRepository, PostgresLaunchWindowRepository, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spaceout_api=debug,spaceout_ledger=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting SpaceOut API on port {}", config.server.port);

    let mut pricing = config.pricing.clone();
    let (budgets, launch_windows): (Arc<dyn BudgetRepository>, Arc<dyn LaunchWindowRepository>) =
        match &config.database {
            Some(db_config) => {
                let db = DbClient::new(&db_config.url, db_config.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await.context("Failed to run migrations")?;
                pricing = db
                    .fetch_pricing_overrides(pricing)
                    .await
                    .context("Failed to read pricing rules")?;
                (
                    Arc::new(PostgresBudgetRepository::new(db.pool.clone())),
                    Arc::new(PostgresLaunchWindowRepository::new(db.pool.clone())),
                )
            }
            None => {
                tracing::warn!("No database configured, budgets are held in memory only");
                (
                    Arc::new(InMemoryBudgetRepository::new()),
                    Arc::new(InMemoryLaunchWindowRepository::default()),
                )
            }
        };

    let rate_limit = match &config.redis {
        Some(redis_config) => Some(RateLimit {
            redis: Arc::new(RedisClient::new(&redis_config.url).await.context("Invalid Redis URL")?),
            per_minute: redis_config.rate_limit_per_minute,
        }),
        None => None,
    };

    let services = Services {
        pricing,
        ledger: config.ledger.clone(),
        budgets,
        launch_windows,
        verifier: Arc::new(ReceiptVerifier::new(&config.auth.payment_receipt_secret)),
    };
    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };
    let app_state = AppState::new(services, auth, rate_limit).context("Invalid pricing configuration")?;

    tokio::spawn(worker::start_event_logger(app_state.events.subscribe()));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
