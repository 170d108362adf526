pub mod budget;
pub mod launch;
pub mod repository;
pub mod identity;
pub mod payment;

pub use budget::{DecrementOutcome, EntryKind, LedgerEntry, NewBudget, UserBudget};
pub use identity::{IdentityProvider, UserId, UserIdentity};
pub use repository::{BudgetRepository, LaunchWindowRepository, StoreError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient budget: requested {requested}, available {available}")]
    InsufficientFunds { requested: i64, available: i64 },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Payment not confirmed: {0}")]
    PaymentNotConfirmed(String),
    /// Stored data that cannot be read back. Retrying will not help.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

impl CoreError {
    /// Only infrastructure failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(msg) => CoreError::CorruptRecord(msg),
            other => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
