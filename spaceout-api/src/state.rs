use std::sync::Arc;
use spaceout_catalog::{PricingConfig, PricingEngine};
use spaceout_core::payment::PaymentVerifier;
use spaceout_core::{BudgetRepository, CoreResult, LaunchWindowRepository};
use spaceout_ledger::{BookingDesk, BudgetLedger, LedgerSettings};
use spaceout_shared::models::events::DomainEvent;
use spaceout_store::RedisClient;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub pricing: Arc<PricingEngine>,
    pub ledger: Arc<BudgetLedger>,
    pub bookings: Arc<BookingDesk>,
    pub launch_windows: Arc<dyn LaunchWindowRepository>,
    pub rate_limit: Option<RateLimit>,
    pub events: broadcast::Sender<DomainEvent>,
    pub auth: AuthConfig,
}

/// Gateways and settings the state is assembled from.
pub struct Services {
    pub pricing: PricingConfig,
    pub ledger: LedgerSettings,
    pub budgets: Arc<dyn BudgetRepository>,
    pub launch_windows: Arc<dyn LaunchWindowRepository>,
    pub verifier: Arc<dyn PaymentVerifier>,
}

impl AppState {
    pub fn new(services: Services, auth: AuthConfig, rate_limit: Option<RateLimit>) -> CoreResult<Self> {
        let (events, _) = broadcast::channel(256);
        let pricing = PricingEngine::new(services.pricing)?;
        let ledger = Arc::new(BudgetLedger::new(services.budgets, services.ledger).with_events(events.clone()));
        let bookings = BookingDesk::new(pricing.clone(), ledger.clone(), services.verifier).with_events(events.clone());

        Ok(Self {
            pricing: Arc::new(pricing),
            ledger,
            bookings: Arc::new(bookings),
            launch_windows: services.launch_windows,
            rate_limit,
            events,
            auth,
        })
    }
}
