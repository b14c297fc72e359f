//! Financial routes: bank accounts, movements, and the period summary.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::routes::extract::{Json, Path, Query};
use crate::routes::tenant::TenantContext;
use crate::routes::{PeriodQuery, list_params};
use crate::services::financeiro::{
    self as fin_svc, Balance, BankAccount, BankAccountInput, Movement, MovementFilter, MovementInput, SettleInput,
    Summary,
};
use crate::services::tenant::{Module, Permission};
use crate::state::AppState;

// =============================================================================
// CONTAS BANCARIAS
// =============================================================================

pub async fn list_bank_accounts(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(list): Query<ListQuery>,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    ctx.require(Module::Financeiro, Permission::View)?;
    let params = list_params(&state, list)?;
    Ok(Json(fin_svc::list_bank_accounts(&state.pool, ctx.tenant_id(), &params).await?))
}

pub async fn get_bank_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<BankAccount>, ApiError> {
    ctx.require(Module::Financeiro, Permission::View)?;
    Ok(Json(fin_svc::get_bank_account(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn create_bank_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<BankAccountInput>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    let account = fin_svc::create_bank_account(&state.pool, ctx.tenant_id(), &body).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_bank_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<BankAccountInput>,
) -> Result<Json<BankAccount>, ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    Ok(Json(fin_svc::update_bank_account(&state.pool, ctx.tenant_id(), id, &body).await?))
}

pub async fn delete_bank_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    fin_svc::delete_bank_account(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub until: Option<Date>,
}

/// `GET /api/financeiro/contas-bancarias/{id}/saldo?until=`
pub async fn bank_account_balance(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Balance>, ApiError> {
    ctx.require(Module::Financeiro, Permission::View)?;
    Ok(Json(fin_svc::bank_account_balance(&state.pool, ctx.tenant_id(), id, query.until).await?))
}

// =============================================================================
// MOVIMENTACOES
// =============================================================================

pub async fn list_movements(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(list): Query<ListQuery>,
    Query(filter): Query<MovementFilter>,
) -> Result<Json<Vec<Movement>>, ApiError> {
    ctx.require(Module::Financeiro, Permission::View)?;
    let params = list_params(&state, list)?;
    Ok(Json(fin_svc::list_movements(&state.pool, ctx.tenant_id(), &params, &filter).await?))
}

pub async fn get_movement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Movement>, ApiError> {
    ctx.require(Module::Financeiro, Permission::View)?;
    Ok(Json(fin_svc::get_movement(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn create_movement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<MovementInput>,
) -> Result<(StatusCode, Json<Movement>), ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    let movement = fin_svc::create_movement(&state.pool, ctx.tenant_id(), ctx.user.id, &body).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn update_movement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<MovementInput>,
) -> Result<Json<Movement>, ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    Ok(Json(fin_svc::update_movement(&state.pool, ctx.tenant_id(), id, &body).await?))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    fin_svc::delete_movement(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/financeiro/movimentacoes/{id}/baixa`: body optional.
pub async fn settle_movement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<Movement>, ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    let input = if body.is_empty() { SettleInput::default() } else { Json::<SettleInput>::from_bytes(&body)?.0 };
    let paid_date = input.paid_date;
    Ok(Json(fin_svc::settle_movement(&state.pool, ctx.tenant_id(), id, paid_date).await?))
}

/// `POST /api/financeiro/movimentacoes/{id}/cancelar`
pub async fn cancel_movement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Movement>, ApiError> {
    ctx.require(Module::Financeiro, Permission::Edit)?;
    Ok(Json(fin_svc::cancel_movement(&state.pool, ctx.tenant_id(), id).await?))
}

/// `GET /api/financeiro/resumo?from=&to=`
pub async fn summary(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<Summary>, ApiError> {
    ctx.require(Module::Financeiro, Permission::View)?;
    let (from, to) = period.validated()?;
    Ok(Json(fin_svc::summary(&state.pool, ctx.tenant_id(), from, to).await?))
}
