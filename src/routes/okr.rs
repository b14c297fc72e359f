//! OKR routes: objectives, key results, tasks.

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::routes::extract::{Json, Path, Query};
use crate::routes::list_params;
use crate::routes::tenant::TenantContext;
use crate::services::okr::{
    self as okr_svc, CheckInInput, KeyResult, KeyResultInput, Objective, ObjectiveDetail, ObjectiveFilter,
    ObjectiveInput, Task, TaskDoneInput, TaskInput, TaskTree,
};
use crate::services::tenant::{Module, Permission};
use crate::state::AppState;

// =============================================================================
// OBJETIVOS
// =============================================================================

pub async fn list_objectives(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(list): Query<ListQuery>,
    Query(filter): Query<ObjectiveFilter>,
) -> Result<Json<Vec<Objective>>, ApiError> {
    ctx.require(Module::Okr, Permission::View)?;
    let params = list_params(&state, list)?;
    Ok(Json(okr_svc::list_objectives(&state.pool, ctx.tenant_id(), &params, &filter).await?))
}

pub async fn get_objective(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ObjectiveDetail>, ApiError> {
    ctx.require(Module::Okr, Permission::View)?;
    Ok(Json(okr_svc::get_objective(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn create_objective(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<ObjectiveInput>,
) -> Result<(StatusCode, Json<Objective>), ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    let objective = okr_svc::create_objective(&state.pool, ctx.tenant_id(), &body).await?;
    Ok((StatusCode::CREATED, Json(objective)))
}

pub async fn update_objective(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ObjectiveInput>,
) -> Result<Json<ObjectiveDetail>, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    Ok(Json(okr_svc::update_objective(&state.pool, ctx.tenant_id(), id, &body).await?))
}

pub async fn delete_objective(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    okr_svc::delete_objective(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// RESULTADOS-CHAVE
// =============================================================================

pub async fn list_key_results(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<Vec<KeyResult>>, ApiError> {
    ctx.require(Module::Okr, Permission::View)?;
    Ok(Json(okr_svc::list_key_results(&state.pool, ctx.tenant_id(), objective_id).await?))
}

pub async fn create_key_result(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(objective_id): Path<Uuid>,
    Json(body): Json<KeyResultInput>,
) -> Result<(StatusCode, Json<KeyResult>), ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    let kr = okr_svc::create_key_result(&state.pool, ctx.tenant_id(), objective_id, &body).await?;
    Ok((StatusCode::CREATED, Json(kr)))
}

pub async fn get_key_result(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<KeyResult>, ApiError> {
    ctx.require(Module::Okr, Permission::View)?;
    Ok(Json(okr_svc::get_key_result(&state.pool, ctx.tenant_id(), id).await?))
}

pub async fn update_key_result(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<KeyResultInput>,
) -> Result<Json<KeyResult>, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    Ok(Json(okr_svc::update_key_result(&state.pool, ctx.tenant_id(), id, &body).await?))
}

/// `PATCH /api/okr/resultados-chave/{id}`: record a new current value.
pub async fn check_in(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CheckInInput>,
) -> Result<Json<KeyResult>, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    Ok(Json(okr_svc::check_in(&state.pool, ctx.tenant_id(), id, body.current_value).await?))
}

pub async fn delete_key_result(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    okr_svc::delete_key_result(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// TAREFAS
// =============================================================================

pub async fn list_tasks(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(key_result_id): Path<Uuid>,
) -> Result<Json<TaskTree>, ApiError> {
    ctx.require(Module::Okr, Permission::View)?;
    Ok(Json(okr_svc::list_tasks(&state.pool, ctx.tenant_id(), key_result_id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(key_result_id): Path<Uuid>,
    Json(body): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    let task = okr_svc::create_task(&state.pool, ctx.tenant_id(), key_result_id, &body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<TaskInput>,
) -> Result<Json<Task>, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    Ok(Json(okr_svc::update_task(&state.pool, ctx.tenant_id(), id, &body).await?))
}

/// `PATCH /api/okr/tarefas/{id}`: toggle completion.
pub async fn set_task_done(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
    Json(body): Json<TaskDoneInput>,
) -> Result<Json<Task>, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    Ok(Json(okr_svc::set_task_done(&state.pool, ctx.tenant_id(), id, body.done).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Okr, Permission::Edit)?;
    okr_svc::delete_task(&state.pool, ctx.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
