use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use serde_json::Value;
use spaceout_catalog::PricingConfig;
use spaceout_core::StoreError;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rows of `pricing_rules` (`{"value": <int>}`) on `defaults`.
    pub async fn fetch_pricing_overrides(&self, defaults: PricingConfig) -> Result<PricingConfig, sqlx::Error> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT rule_key, rule_value FROM pricing_rules")
            .fetch_all(&self.pool)
            .await?;

        Ok(apply_pricing_rules(defaults, rows))
    }
}

pub(crate) fn apply_pricing_rules(defaults: PricingConfig, rows: Vec<(String, Value)>) -> PricingConfig {
    let mut rules = defaults;

    for (key, value) in rows {
        let Some(v) = value.get("value").and_then(Value::as_i64) else {
            warn!("Ignoring pricing rule {} with non-integer value {}", key, value);
            continue;
        };
        match key.as_str() {
            "base_cost_per_distance_unit" => rules.base_cost_per_distance_unit = v,
            "unit_scale" => rules.unit_scale = v,
            "life_support_cost_per_day" => rules.life_support_cost_per_day = v,
            "hibernation_cost_per_day" => rules.hibernation_cost_per_day = v,
            "cargo_cost_per_kg" => rules.cargo_cost_per_kg = v,
            "tax_rate_bps" => rules.tax_rate_bps = v,
            "facility_fee" => rules.facility_fee = v,
            "max_cargo_kg" => match u32::try_from(v) {
                Ok(kg) => rules.max_cargo_kg = kg,
                Err(_) => warn!("Ignoring out-of-range max_cargo_kg {}", v),
            },
            other => warn!("Unknown pricing rule {}", other),
        }
    }

    rules
}

/// Classify a driver error for the retry policy.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // serialization_failure, deadlock_detected
            Some("40001") | Some("40P01") => StoreError::Conflict(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(err.to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}
