//! In-process gateways. Used by tests and by the API when no database is
//! configured.

use async_trait::async_trait;
use chrono::Utc;
use spaceout_core::launch::LaunchWindowOffer;
use spaceout_core::{
    BudgetRepository, DecrementOutcome, EntryKind, LaunchWindowRepository, LedgerEntry, NewBudget,
    StoreError, UserBudget, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Audit entries per user plus an index of applied request ids.
#[derive(Default)]
struct Journal {
    entries: HashMap<UserId, Vec<LedgerEntry>>,
    applied: HashSet<(UserId, Uuid)>,
}

impl Journal {
    fn contains(&self, user_id: &UserId, request_id: Uuid) -> bool {
        self.applied.contains(&(user_id.clone(), request_id))
    }

    fn push(&mut self, entry: LedgerEntry) {
        self.applied.insert((entry.user_id.clone(), entry.request_id));
        self.entries.entry(entry.user_id.clone()).or_default().push(entry);
    }
}

#[derive(Default)]
struct State {
    budgets: HashMap<UserId, UserBudget>,
    journal: Journal,
    fail_next: u32,
    lose_next: u32,
}

/// Budget table behind a single mutex, so every method is atomic in the
/// same way a single SQL statement is.
#[derive(Default)]
pub struct InMemoryBudgetRepository {
    state: Mutex<State>,
}

impl InMemoryBudgetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls fail with `Unavailable` before touching data.
    pub fn inject_failures(&self, n: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next = n;
        }
    }

    /// Apply the next `n` mutations, then report `Unavailable` as if the
    /// response had been lost in transit.
    pub fn inject_lost_responses(&self, n: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.lose_next = n;
        }
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().map(|s| s.budgets.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("budget table lock poisoned".into()))?;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(state)
    }

    fn respond<T>(state: &mut State, value: T) -> Result<T, StoreError> {
        if state.lose_next > 0 {
            state.lose_next -= 1;
            return Err(StoreError::Unavailable("response lost".into()));
        }
        Ok(value)
    }
}

fn entry(budget: &UserBudget, request_id: Uuid, kind: EntryKind, delta_minor: i64) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        user_id: budget.user_id.clone(),
        request_id,
        kind,
        delta_minor,
        balance_after_minor: budget.balance_minor,
        created_at: budget.updated_at,
    }
}

#[async_trait]
impl BudgetRepository for InMemoryBudgetRepository {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserBudget>, StoreError> {
        let state = self.lock()?;
        Ok(state.budgets.get(user_id).cloned())
    }

    async fn create_if_absent(&self, seed: &NewBudget) -> Result<(UserBudget, bool), StoreError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if let Some(existing) = state.budgets.get(&seed.user_id) {
            let existing = existing.clone();
            let ours = state.journal.contains(&seed.user_id, seed.request_id);
            return Self::respond(state, (existing, ours));
        }

        let now = Utc::now();
        let budget = UserBudget {
            user_id: seed.user_id.clone(),
            email: seed.email.clone(),
            balance_minor: seed.balance_minor,
            currency: seed.currency.clone(),
            created_at: now,
            updated_at: now,
        };
        let allocation = entry(&budget, seed.request_id, EntryKind::InitialAllocation, seed.balance_minor);
        state.journal.push(allocation);
        state.budgets.insert(seed.user_id.clone(), budget.clone());
        Self::respond(state, (budget, true))
    }

    async fn set_balance(
        &self,
        user_id: &UserId,
        balance_minor: i64,
        request_id: Uuid,
    ) -> Result<Option<UserBudget>, StoreError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let replayed = state.journal.contains(user_id, request_id);

        let updated = match state.budgets.get_mut(user_id) {
            None => None,
            Some(budget) if replayed => Some(budget.clone()),
            Some(budget) => {
                let delta = balance_minor - budget.balance_minor;
                budget.balance_minor = balance_minor;
                budget.updated_at = Utc::now();
                state.journal.push(entry(budget, request_id, EntryKind::Adjustment, delta));
                Some(budget.clone())
            }
        };
        Self::respond(state, updated)
    }

    async fn conditional_decrement(
        &self,
        user_id: &UserId,
        amount_minor: i64,
        request_id: Uuid,
    ) -> Result<DecrementOutcome, StoreError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let replayed = state.journal.contains(user_id, request_id);

        let outcome = match state.budgets.get_mut(user_id) {
            None => DecrementOutcome::Missing,
            Some(budget) if replayed => DecrementOutcome::Applied { budget: budget.clone(), replayed: true },
            Some(budget) if budget.balance_minor < amount_minor => {
                DecrementOutcome::Insufficient { available_minor: budget.balance_minor }
            }
            Some(budget) => {
                budget.balance_minor -= amount_minor;
                budget.updated_at = Utc::now();
                state.journal.push(entry(budget, request_id, EntryKind::Deduction, -amount_minor));
                DecrementOutcome::Applied { budget: budget.clone(), replayed: false }
            }
        };
        Self::respond(state, outcome)
    }

    async fn list_entries(&self, user_id: &UserId, limit: u32) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .journal
            .entries
            .get(user_id)
            .map(|entries| entries.iter().rev().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}

/// Fixed set of published launch windows.
#[derive(Default)]
pub struct InMemoryLaunchWindowRepository {
    offers: Vec<LaunchWindowOffer>,
    unavailable: bool,
}

impl InMemoryLaunchWindowRepository {
    pub fn new(offers: Vec<LaunchWindowOffer>) -> Self {
        Self { offers, unavailable: false }
    }

    /// A repository whose every call fails, for exercising error paths.
    pub fn unavailable() -> Self {
        Self { offers: Vec::new(), unavailable: true }
    }
}

#[async_trait]
impl LaunchWindowRepository for InMemoryLaunchWindowRepository {
    async fn list_offers(&self, limit: u32) -> Result<Vec<LaunchWindowOffer>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("launch window table offline".into()));
        }
        let mut offers = self.offers.clone();
        offers.sort_by_key(|o| o.departure_at);
        offers.truncate(limit as usize);
        Ok(offers)
    }

    async fn find_offer(&self, id: Uuid) -> Result<Option<LaunchWindowOffer>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("launch window table offline".into()));
        }
        Ok(self.offers.iter().find(|o| o.id == id).cloned())
    }
}
