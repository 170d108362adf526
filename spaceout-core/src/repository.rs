use async_trait::async_trait;
use uuid::Uuid;
use crate::budget::{DecrementOutcome, LedgerEntry, NewBudget, UserBudget};
use crate::identity::UserId;
use crate::launch::LaunchWindowOffer;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network, pool or timeout failure. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Serialization failure or lost race inside the store. Safe to retry.
    #[error("store conflict: {0}")]
    Conflict(String),
    /// A row that cannot be mapped back into a domain type.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Conflict(_))
    }
}

/// Gateway to the table that owns user budgets.
///
/// Every mutating method must be a single atomic operation at the storage
/// layer; callers never read-then-write.
#[async_trait]
pub trait BudgetRepository: Send + Sync {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserBudget>, StoreError>;

    /// Insert the seed unless a record already exists. Returns the surviving
    /// record and whether this seed created it, judged by `seed.request_id`
    /// so a retry after a lost response still reports `true`.
    async fn create_if_absent(&self, seed: &NewBudget) -> Result<(UserBudget, bool), StoreError>;

    /// Overwrite the balance. `None` when the user has no record.
    async fn set_balance(
        &self,
        user_id: &UserId,
        balance_minor: i64,
        request_id: Uuid,
    ) -> Result<Option<UserBudget>, StoreError>;

    /// Subtract `amount_minor` only where `balance >= amount_minor`.
    async fn conditional_decrement(
        &self,
        user_id: &UserId,
        amount_minor: i64,
        request_id: Uuid,
    ) -> Result<DecrementOutcome, StoreError>;

    /// Most recent first.
    async fn list_entries(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>, StoreError>;
}

/// Read-only access to published launch windows.
#[async_trait]
pub trait LaunchWindowRepository: Send + Sync {
    /// Earliest departures first.
    async fn list_offers(&self, limit: u32) -> Result<Vec<LaunchWindowOffer>, StoreError>;

    async fn find_offer(&self, id: Uuid) -> Result<Option<LaunchWindowOffer>, StoreError>;
}
