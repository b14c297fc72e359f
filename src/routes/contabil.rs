//! Accounting routes: chart of accounts, ledger entries, balancete, razão.

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::routes::extract::{Json, Path, Query};
use crate::routes::tenant::TenantContext;
use crate::routes::{PeriodQuery, list_params};
use crate::services::contabil::{
    self as contabil_svc, Account, AccountFilter, AccountInput, Balancete, EntryFilter, LedgerEntry, LedgerEntryInput,
    Razao,
};
use crate::services::tenant::{Module, Permission};
use crate::state::AppState;

// =============================================================================
// CONTAS
// =============================================================================

pub async fn list_accounts(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(list): Query<ListQuery>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<Vec<Account>>, ApiError> {
    ctx.require(Module::Contabil, Permission::View)?;
    let params = list_params(&state, list)?;
    Ok(Json(contabil_svc::list_accounts(&state.pool, ctx.tenant_id(), &params, &filter).await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, ApiError> {
    ctx.require(Module::Contabil, Permission::View)?;
    Ok(Json(contabil_svc::get_account(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn create_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<AccountInput>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    ctx.require(Module::Contabil, Permission::Edit)?;
    let account = contabil_svc::create_account(&state.pool, ctx.tenant_id(), &body).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<AccountInput>,
) -> Result<Json<Account>, ApiError> {
    ctx.require(Module::Contabil, Permission::Edit)?;
    Ok(Json(contabil_svc::update_account(&state.pool, ctx.tenant_id(), id, &body).await?))
}

pub async fn delete_account(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Contabil, Permission::Edit)?;
    contabil_svc::delete_account(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/contabil/contas/{id}/razao?from=&to=`
pub async fn razao(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<Razao>, ApiError> {
    ctx.require(Module::Contabil, Permission::View)?;
    let (from, to) = period.validated()?;
    Ok(Json(contabil_svc::razao(&state.pool, ctx.tenant_id(), id, from, to).await?))
}

// =============================================================================
// LANCAMENTOS
// =============================================================================

pub async fn list_entries(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(list): Query<ListQuery>,
    Query(filter): Query<EntryFilter>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    ctx.require(Module::Contabil, Permission::View)?;
    let params = list_params(&state, list)?;
    Ok(Json(contabil_svc::list_entries(&state.pool, ctx.tenant_id(), &params, &filter).await?))
}

pub async fn get_entry(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerEntry>, ApiError> {
    ctx.require(Module::Contabil, Permission::View)?;
    Ok(Json(contabil_svc::get_entry(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<LedgerEntryInput>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    ctx.require(Module::Contabil, Permission::Edit)?;
    let entry = contabil_svc::create_entry(&state.pool, ctx.tenant_id(), ctx.user.id, &body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<LedgerEntryInput>,
) -> Result<Json<LedgerEntry>, ApiError> {
    ctx.require(Module::Contabil, Permission::Edit)?;
    Ok(Json(contabil_svc::update_entry(&state.pool, ctx.tenant_id(), id, &body).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Contabil, Permission::Edit)?;
    contabil_svc::delete_entry(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/contabil/balancete?from=&to=`
pub async fn balancete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<Balancete>, ApiError> {
    ctx.require(Module::Contabil, Permission::View)?;
    let (from, to) = period.validated()?;
    Ok(Json(contabil_svc::balancete(&state.pool, ctx.tenant_id(), from, to).await?))
}
