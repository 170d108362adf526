use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use spaceout_catalog::currency::{format_base, format_ntc};
use spaceout_core::identity::{require_user, ResolvedIdentity};
use spaceout_core::{LedgerEntry, UserBudget};
use uuid::Uuid;
use crate::{error::AppError, state::AppState};

const DEFAULT_ENTRY_PAGE: u32 = 20;

#[derive(Debug, Serialize)]
pub struct BudgetView {
    pub user_id: String,
    pub balance_minor: i64,
    pub currency: String,
    pub balance_ntc: String,
    pub balance_base: String,
    /// Set on the call that allocated the budget.
    pub created: bool,
}

impl BudgetView {
    fn new(budget: UserBudget, created: bool) -> Self {
        Self {
            user_id: budget.user_id.to_string(),
            balance_ntc: format_ntc(budget.balance_minor),
            balance_base: format_base(budget.balance_minor),
            balance_minor: budget.balance_minor,
            currency: budget.currency,
            created,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    pub amount_minor: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    pub amount_minor: i64,
    /// Reuse the same id when resubmitting after a failed response.
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DeductResponse {
    pub request_id: Uuid,
    pub amount_minor: i64,
    pub replayed: bool,
    pub budget: BudgetView,
}

#[derive(Debug, Deserialize)]
pub struct EntryParams {
    pub limit: Option<u32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/budget", get(get_budget).put(set_budget))
        .route("/v1/budget/deduct", post(deduct))
        .route("/v1/budget/entries", get(list_entries))
}

async fn get_budget(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
) -> Result<Json<BudgetView>, AppError> {
    let user = require_user(&identity).await?;
    let access = state.ledger.get_budget(&user).await?;
    Ok(Json(BudgetView::new(access.budget, access.created)))
}

async fn set_budget(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Json(req): Json<SetBudgetRequest>,
) -> Result<Json<BudgetView>, AppError> {
    let user = require_user(&identity).await?;
    let budget = state.ledger.set_budget(&user, req.amount_minor).await?;
    Ok(Json(BudgetView::new(budget, false)))
}

async fn deduct(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Json(req): Json<DeductRequest>,
) -> Result<Json<DeductResponse>, AppError> {
    let user = require_user(&identity).await?;
    let request_id = req.request_id.unwrap_or_else(Uuid::new_v4);
    let deduction = state.ledger.deduct(&user, req.amount_minor, request_id).await?;

    Ok(Json(DeductResponse {
        request_id: deduction.request_id,
        amount_minor: deduction.amount_minor,
        replayed: deduction.replayed,
        budget: BudgetView::new(deduction.budget, false),
    }))
}

async fn list_entries(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Query(params): Query<EntryParams>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let user = require_user(&identity).await?;
    let entries = state
        .ledger
        .entries(&user, params.limit.unwrap_or(DEFAULT_ENTRY_PAGE))
        .await?;
    Ok(Json(entries))
}
