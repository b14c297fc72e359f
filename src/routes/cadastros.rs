//! Cost center routes (`/api/cadastros/centros-custo`).

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::routes::extract::{Json, Path, Query};
use crate::routes::list_params;
use crate::routes::tenant::TenantContext;
use crate::services::cadastros::{self as cadastros_svc, CostCenter, CostCenterFilter, CostCenterInput};
use crate::services::tenant::{Module, Permission};
use crate::state::AppState;

pub async fn list_cost_centers(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(list): Query<ListQuery>,
    Query(filter): Query<CostCenterFilter>,
) -> Result<Json<Vec<CostCenter>>, ApiError> {
    ctx.require(Module::Cadastros, Permission::View)?;
    let params = list_params(&state, list)?;
    Ok(Json(cadastros_svc::list_cost_centers(&state.pool, ctx.tenant_id(), &params, &filter).await?))
}

pub async fn get_cost_center(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CostCenter>, ApiError> {
    ctx.require(Module::Cadastros, Permission::View)?;
    Ok(Json(cadastros_svc::get_cost_center(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn create_cost_center(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<CostCenterInput>,
) -> Result<(StatusCode, Json<CostCenter>), ApiError> {
    ctx.require(Module::Cadastros, Permission::Edit)?;
    let center = cadastros_svc::create_cost_center(&state.pool, ctx.tenant_id(), &body).await?;
    Ok((StatusCode::CREATED, Json(center)))
}

pub async fn update_cost_center(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CostCenterInput>,
) -> Result<Json<CostCenter>, ApiError> {
    ctx.require(Module::Cadastros, Permission::Edit)?;
    Ok(Json(cadastros_svc::update_cost_center(&state.pool, ctx.tenant_id(), id, &body).await?))
}

pub async fn delete_cost_center(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Cadastros, Permission::Edit)?;
    cadastros_svc::delete_cost_center(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
