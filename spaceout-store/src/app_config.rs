use serde::Deserialize;
use spaceout_catalog::PricingConfig;
use spaceout_ledger::LedgerSettings;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Without a database the API runs on in-memory gateways.
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_rate_limit() -> i64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Shared secret the payment provider signs receipts with.
    pub payment_receipt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. SPACEOUT__AUTH__JWT_SECRET
            .add_source(
                config::Environment::with_prefix("SPACEOUT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &str = include_str!("../../config/default.toml");

    fn parse(extra: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS, config::FileFormat::Toml))
            .add_source(config::File::from_str(extra, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_shipped_defaults_match_built_in_rate_card() {
        let cfg = parse("");
        assert_eq!(cfg.pricing, PricingConfig::default());
        assert_eq!(cfg.ledger, LedgerSettings::default());
        assert_eq!(cfg.redis.unwrap().rate_limit_per_minute, 120);
        assert!(cfg.database.is_some());
    }

    #[test]
    fn test_local_overrides_win() {
        let cfg = parse("[pricing]\ntax_rate_bps = 500\n[ledger.retry]\nmax_retries = 0\n");
        assert_eq!(cfg.pricing.tax_rate_bps, 500);
        assert_eq!(cfg.pricing.facility_fee, 150_000);
        assert_eq!(cfg.ledger.retry.max_retries, 0);
    }
}
