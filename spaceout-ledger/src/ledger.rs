use serde::{Deserialize, Serialize};
use spaceout_core::{
    BudgetRepository, CoreError, CoreResult, DecrementOutcome, LedgerEntry, NewBudget, UserBudget,
    UserIdentity,
};
use spaceout_shared::models::events::{BudgetAllocatedEvent, BudgetDeductedEvent, DomainEvent};
use spaceout_shared::Masked;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::retry::RetryPolicy;

/// ₹1 crore, in minor units.
pub const DEFAULT_INITIAL_ALLOCATION_MINOR: i64 = 1_000_000_000;
pub const DEFAULT_CURRENCY: &str = "INR";
pub const MAX_ENTRY_PAGE: u32 = 100;
/// Largest balance or deduction the ledger accepts (₹100 crore crore). Keeps
/// balance deltas and display rounding inside `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSettings {
    pub initial_allocation_minor: i64,
    pub currency: String,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            initial_allocation_minor: DEFAULT_INITIAL_ALLOCATION_MINOR,
            currency: DEFAULT_CURRENCY.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetAccess {
    pub budget: UserBudget,
    /// True when this call allocated the record.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction {
    pub request_id: Uuid,
    pub amount_minor: i64,
    pub budget: UserBudget,
    /// The request id had already been applied by an earlier attempt.
    pub replayed: bool,
}

/// Per-user balances held by a [`BudgetRepository`].
///
/// The repository is the only owner of the balance. This type validates
/// amounts, applies the retry policy and publishes events; it keeps no
/// balance state of its own.
pub struct BudgetLedger {
    repo: Arc<dyn BudgetRepository>,
    settings: LedgerSettings,
    events: Option<broadcast::Sender<DomainEvent>>,
}

impl BudgetLedger {
    pub fn new(repo: Arc<dyn BudgetRepository>, settings: LedgerSettings) -> Self {
        Self { repo, settings, events: None }
    }

    pub fn with_events(mut self, tx: broadcast::Sender<DomainEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Fetch the user's budget, allocating it on first access.
    pub async fn get_budget(&self, user: &UserIdentity) -> CoreResult<BudgetAccess> {
        let retry = &self.settings.retry;

        if let Some(budget) = retry.run("get_budget", || self.repo.get(&user.id)).await? {
            return Ok(BudgetAccess { budget, created: false });
        }

        let seed = NewBudget {
            user_id: user.id.clone(),
            email: user.email.clone(),
            balance_minor: self.settings.initial_allocation_minor,
            currency: self.settings.currency.clone(),
            request_id: Uuid::new_v4(),
        };
        let (budget, created) = retry
            .run("create_budget", || self.repo.create_if_absent(&seed))
            .await?;

        if created {
            info!(
                "Allocated initial budget of {} to user {} ({})",
                budget.balance_minor,
                user.id,
                Masked::new(user.email.clone().unwrap_or_default())
            );
            self.publish(DomainEvent::BudgetAllocated(BudgetAllocatedEvent {
                user_id: user.id.to_string(),
                amount_minor: budget.balance_minor,
                currency: budget.currency.clone(),
                timestamp: chrono::Utc::now().timestamp(),
            }));
        } else {
            debug!("Budget for user {} was created by a concurrent caller", user.id);
        }

        Ok(BudgetAccess { budget, created })
    }

    /// Overwrite the balance.
    pub async fn set_budget(&self, user: &UserIdentity, amount_minor: i64) -> CoreResult<UserBudget> {
        validate_amount(amount_minor)?;
        let request_id = Uuid::new_v4();
        let retry = &self.settings.retry;

        let updated = retry
            .run("set_budget", || self.repo.set_balance(&user.id, amount_minor, request_id))
            .await?;
        let budget = match updated {
            Some(budget) => budget,
            None => {
                // No record yet: allocate, then overwrite.
                self.get_budget(user).await?;
                retry
                    .run("set_budget", || self.repo.set_balance(&user.id, amount_minor, request_id))
                    .await?
                    .ok_or_else(|| CoreError::StoreUnavailable(format!("budget for {} disappeared", user.id)))?
            }
        };

        info!("Budget for user {} set to {}", user.id, budget.balance_minor);
        Ok(budget)
    }

    /// Atomically subtract `amount_minor` if the balance covers it.
    ///
    /// `request_id` makes the call idempotent: retrying with the same id after
    /// a lost response never deducts twice.
    pub async fn deduct(
        &self,
        user: &UserIdentity,
        amount_minor: i64,
        request_id: Uuid,
    ) -> CoreResult<Deduction> {
        validate_amount(amount_minor)?;
        let retry = &self.settings.retry;

        let mut outcome = retry
            .run("deduct", || self.repo.conditional_decrement(&user.id, amount_minor, request_id))
            .await?;

        if outcome == DecrementOutcome::Missing {
            self.get_budget(user).await?;
            outcome = retry
                .run("deduct", || self.repo.conditional_decrement(&user.id, amount_minor, request_id))
                .await?;
        }

        match outcome {
            DecrementOutcome::Applied { budget, replayed } => {
                if replayed {
                    info!("Deduction {} for user {} already applied", request_id, user.id);
                } else {
                    info!(
                        "Deducted {} from user {}, balance now {}",
                        amount_minor, user.id, budget.balance_minor
                    );
                    self.publish(DomainEvent::BudgetDeducted(BudgetDeductedEvent {
                        user_id: user.id.to_string(),
                        request_id,
                        amount_minor,
                        balance_after_minor: budget.balance_minor,
                        timestamp: chrono::Utc::now().timestamp(),
                    }));
                }
                Ok(Deduction { request_id, amount_minor, budget, replayed })
            }
            DecrementOutcome::Insufficient { available_minor } => {
                warn!(
                    "Insufficient budget for user {}: requested {}, available {}",
                    user.id, amount_minor, available_minor
                );
                Err(CoreError::InsufficientFunds { requested: amount_minor, available: available_minor })
            }
            DecrementOutcome::Missing => Err(CoreError::StoreUnavailable(format!(
                "budget for {} disappeared",
                user.id
            ))),
        }
    }

    pub async fn entries(&self, user: &UserIdentity, limit: u32) -> CoreResult<Vec<LedgerEntry>> {
        let limit = limit.clamp(1, MAX_ENTRY_PAGE);
        let entries = self
            .settings
            .retry
            .run("list_entries", || self.repo.list_entries(&user.id, limit))
            .await?;
        Ok(entries)
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine.
            let _ = tx.send(event);
        }
    }
}

/// Amounts must lie in `0..=MAX_AMOUNT_MINOR`.
pub fn validate_amount(amount_minor: i64) -> CoreResult<()> {
    if amount_minor < 0 {
        return Err(CoreError::InvalidAmount(format!("amount must not be negative, got {}", amount_minor)));
    }
    if amount_minor > MAX_AMOUNT_MINOR {
        return Err(CoreError::InvalidAmount(format!(
            "amount {} exceeds the {} limit",
            amount_minor, MAX_AMOUNT_MINOR
        )));
    }
    Ok(())
}
