use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use spaceout_core::{
    BudgetRepository, DecrementOutcome, EntryKind, LedgerEntry, NewBudget, StoreError, UserBudget, UserId,
};
use uuid::Uuid;
use crate::database::map_sqlx_error;

pub struct PostgresBudgetRepository {
    pool: PgPool,
}

impl PostgresBudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BudgetRow {
    user_id: String,
    email: Option<String>,
    balance_minor: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BudgetRow> for UserBudget {
    fn from(row: BudgetRow) -> Self {
        Self {
            user_id: UserId(row.user_id),
            email: row.email,
            balance_minor: row.balance_minor,
            currency: row.currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    user_id: String,
    request_id: Uuid,
    kind: String,
    delta_minor: i64,
    balance_after_minor: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId(row.user_id),
            request_id: row.request_id,
            kind: row.kind.parse().map_err(StoreError::Corrupt)?,
            delta_minor: row.delta_minor,
            balance_after_minor: row.balance_after_minor,
            created_at: row.created_at,
        })
    }
}

const BUDGET_COLUMNS: &str = "user_id, email, balance_minor, currency, created_at, updated_at";

async fn lock_budget(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
) -> Result<Option<BudgetRow>, sqlx::Error> {
    sqlx::query_as::<_, BudgetRow>(&format!(
        "SELECT {} FROM user_budgets WHERE user_id = $1 FOR UPDATE",
        BUDGET_COLUMNS
    ))
    .bind(user_id.as_str())
    .fetch_optional(&mut **tx)
    .await
}

async fn already_applied(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
    request_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM budget_entries WHERE user_id = $1 AND request_id = $2)",
    )
    .bind(user_id.as_str())
    .bind(request_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(exists)
}

async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    budget: &BudgetRow,
    request_id: Uuid,
    kind: EntryKind,
    delta_minor: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO budget_entries (id, user_id, request_id, kind, delta_minor, balance_after_minor, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(&budget.user_id)
    .bind(request_id)
    .bind(kind.as_str())
    .bind(delta_minor)
    .bind(budget.balance_minor)
    .bind(budget.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl BudgetRepository for PostgresBudgetRepository {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserBudget>, StoreError> {
        let row = sqlx::query_as::<_, BudgetRow>(&format!(
            "SELECT {} FROM user_budgets WHERE user_id = $1",
            BUDGET_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserBudget::from))
    }

    async fn create_if_absent(&self, seed: &NewBudget) -> Result<(UserBudget, bool), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query_as::<_, BudgetRow>(&format!(
            "INSERT INTO user_budgets (user_id, email, balance_minor, currency)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING {}",
            BUDGET_COLUMNS
        ))
        .bind(seed.user_id.as_str())
        .bind(&seed.email)
        .bind(seed.balance_minor)
        .bind(&seed.currency)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let (row, created) = match inserted {
            Some(row) => {
                insert_entry(&mut tx, &row, seed.request_id, EntryKind::InitialAllocation, row.balance_minor)
                    .await
                    .map_err(map_sqlx_error)?;
                (row, true)
            }
            None => {
                // Either another caller won the race or an earlier attempt of
                // this seed committed and its response was lost.
                let row = sqlx::query_as::<_, BudgetRow>(&format!(
                    "SELECT {} FROM user_budgets WHERE user_id = $1",
                    BUDGET_COLUMNS
                ))
                .bind(seed.user_id.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
                let ours = already_applied(&mut tx, &seed.user_id, seed.request_id)
                    .await
                    .map_err(map_sqlx_error)?;
                (row, ours)
            }
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok((row.into(), created))
    }

    async fn set_balance(
        &self,
        user_id: &UserId,
        balance_minor: i64,
        request_id: Uuid,
    ) -> Result<Option<UserBudget>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let Some(current) = lock_budget(&mut tx, user_id).await.map_err(map_sqlx_error)? else {
            return Ok(None);
        };
        if already_applied(&mut tx, user_id, request_id).await.map_err(map_sqlx_error)? {
            return Ok(Some(current.into()));
        }

        let row = sqlx::query_as::<_, BudgetRow>(&format!(
            "UPDATE user_budgets SET balance_minor = $2, updated_at = NOW()
             WHERE user_id = $1
             RETURNING {}",
            BUDGET_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(balance_minor)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        insert_entry(&mut tx, &row, request_id, EntryKind::Adjustment, balance_minor - current.balance_minor)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(Some(row.into()))
    }

    async fn conditional_decrement(
        &self,
        user_id: &UserId,
        amount_minor: i64,
        request_id: Uuid,
    ) -> Result<DecrementOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let Some(current) = lock_budget(&mut tx, user_id).await.map_err(map_sqlx_error)? else {
            return Ok(DecrementOutcome::Missing);
        };
        if already_applied(&mut tx, user_id, request_id).await.map_err(map_sqlx_error)? {
            return Ok(DecrementOutcome::Applied { budget: current.into(), replayed: true });
        }

        let updated = sqlx::query_as::<_, BudgetRow>(&format!(
            "UPDATE user_budgets SET balance_minor = balance_minor - $2, updated_at = NOW()
             WHERE user_id = $1 AND balance_minor >= $2
             RETURNING {}",
            BUDGET_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(amount_minor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = updated else {
            return Ok(DecrementOutcome::Insufficient { available_minor: current.balance_minor });
        };

        insert_entry(&mut tx, &row, request_id, EntryKind::Deduction, -amount_minor)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(DecrementOutcome::Applied { budget: row.into(), replayed: false })
    }

    async fn list_entries(&self, user_id: &UserId, limit: u32) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT id, user_id, request_id, kind, delta_minor, balance_after_minor, created_at
             FROM budget_entries
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}
