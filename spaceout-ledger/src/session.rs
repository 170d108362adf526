use spaceout_core::identity::require_user;
use spaceout_core::{CoreError, CoreResult, IdentityProvider, UserBudget};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use crate::ledger::{BudgetLedger, Deduction};

/// Last balance the store confirmed for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedBalance {
    pub balance_minor: i64,
    /// Set when a later call failed, so the store may hold a different value.
    pub stale: bool,
}

/// Budget access scoped to one signed-in user.
///
/// The cache is a display convenience: it is only ever replaced by a value
/// the store returned and never used to decide whether a deduction may
/// proceed.
pub struct LedgerSession {
    ledger: Arc<BudgetLedger>,
    identity: Arc<dyn IdentityProvider>,
    cache: RwLock<Option<CachedBalance>>,
}

impl LedgerSession {
    pub fn new(ledger: Arc<BudgetLedger>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { ledger, identity, cache: RwLock::new(None) }
    }

    pub async fn cached(&self) -> Option<CachedBalance> {
        *self.cache.read().await
    }

    /// Current balance, allocating the initial budget on first access.
    pub async fn balance(&self) -> CoreResult<UserBudget> {
        let user = require_user(self.identity.as_ref()).await?;
        let result = self.ledger.get_budget(&user).await.map(|access| access.budget);
        self.observe(&result, |b| b.balance_minor).await;
        result
    }

    pub async fn set_budget(&self, amount_minor: i64) -> CoreResult<UserBudget> {
        let user = require_user(self.identity.as_ref()).await?;
        let result = self.ledger.set_budget(&user, amount_minor).await;
        self.observe(&result, |b| b.balance_minor).await;
        result
    }

    pub async fn deduct(&self, amount_minor: i64) -> CoreResult<Deduction> {
        self.deduct_with_request(amount_minor, Uuid::new_v4()).await
    }

    /// Deduct under a caller-chosen request id, so the caller can safely
    /// resubmit after an ambiguous failure.
    pub async fn deduct_with_request(&self, amount_minor: i64, request_id: Uuid) -> CoreResult<Deduction> {
        let user = require_user(self.identity.as_ref()).await?;
        let result = self.ledger.deduct(&user, amount_minor, request_id).await;
        self.observe(&result, |d| d.budget.balance_minor).await;
        result
    }

    async fn observe<T>(&self, result: &CoreResult<T>, balance_of: impl Fn(&T) -> i64) {
        let mut cache = self.cache.write().await;
        match result {
            Ok(value) => {
                *cache = Some(CachedBalance { balance_minor: balance_of(value), stale: false });
            }
            Err(err @ CoreError::InsufficientFunds { .. }) | Err(err @ CoreError::StoreUnavailable(_)) => {
                if let Some(cached) = cache.as_mut() {
                    debug!("Marking cached balance stale after: {}", err);
                    cached.stale = true;
                }
            }
            Err(_) => {}
        }
    }
}
