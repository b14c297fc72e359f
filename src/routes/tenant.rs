//! Tenant routes: companies (`empresas`), members (`usuarios`), and
//! permission flags (`permissoes`), plus the `TenantContext` extractor every
//! module route uses.

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::auth::AuthUser;
use crate::routes::extract::{Json, Path};
use crate::services::session::SessionUser;
use crate::services::tenant::{
    self as tenant_svc, AddMemberInput, Member, Membership, Module, ModuleFlags, Permission, Tenant, TenantError,
    TenantInput, TenantRole, TenantSummary, UpdateMemberInput,
};
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";

// =============================================================================
// TENANT EXTRACTOR
// =============================================================================

/// Authenticated caller plus their membership in the `X-Tenant-Id` tenant.
pub struct TenantContext {
    pub user: SessionUser,
    pub membership: Membership,
}

impl TenantContext {
    #[must_use]
    pub fn tenant_id(&self) -> Uuid {
        self.membership.tenant_id
    }

    /// # Errors
    ///
    /// 403 when the member's role or module allow-list forbids the operation.
    pub fn require(&self, module: Module, permission: Permission) -> Result<(), ApiError> {
        if self.membership.allows(module, permission) {
            return Ok(());
        }
        warn!(
            tenant_id = %self.tenant_id(),
            user_id = %self.user.id,
            module = module.as_str(),
            ?permission,
            "permission denied"
        );
        Err(ApiError::forbidden("Você não tem permissão para esta operação"))
    }

    /// # Errors
    ///
    /// 403 unless the caller owns the tenant.
    pub fn require_owner(&self) -> Result<(), ApiError> {
        if self.membership.role == TenantRole::Owner {
            Ok(())
        } else {
            Err(ApiError::forbidden("Apenas o proprietário pode realizar esta operação"))
        }
    }
}

/// Parse `X-Tenant-Id`.
///
/// # Errors
///
/// 400 when the header is missing or not a UUID.
pub(crate) fn tenant_id_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| ApiError::bad_request("E_TENANT_HEADER", "Cabeçalho X-Tenant-Id ausente ou inválido"))
}

async fn membership_for(state: &AppState, user: &SessionUser, tenant_id: Uuid) -> Result<Membership, ApiError> {
    let membership = tenant_svc::load_membership(&state.pool, tenant_id, user.id)
        .await
        .map_err(TenantError::from)?;
    membership.ok_or_else(|| {
        warn!(%tenant_id, user_id = %user.id, "tenant access denied");
        TenantError::NotMember(tenant_id).into()
    })
}

impl<S> FromRequestParts<S> for TenantContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let tenant_id = tenant_id_from_headers(&parts.headers)?;
        let app_state = AppState::from_ref(state);
        let membership = membership_for(&app_state, &auth.user, tenant_id).await?;
        Ok(Self { user: auth.user, membership })
    }
}

// =============================================================================
// EMPRESAS
// =============================================================================

/// `GET /api/cadastros/empresas`: companies the caller belongs to.
pub async fn list_tenants(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<TenantSummary>>, ApiError> {
    Ok(Json(tenant_svc::list_tenants_for_user(&state.pool, auth.user.id).await?))
}

/// `POST /api/cadastros/empresas`: create a company owned by the caller.
pub async fn create_tenant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TenantInput>,
) -> Result<(StatusCode, Json<Tenant>), ApiError> {
    let tenant = tenant_svc::create_tenant(&state.pool, auth.user.id, &body).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// `GET /api/cadastros/empresas/{id}`
pub async fn get_tenant(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<Json<Tenant>, ApiError> {
    membership_for(&state, &auth.user, id).await?;
    Ok(Json(tenant_svc::get_tenant(&state.pool, id).await?))
}

/// `PUT /api/cadastros/empresas/{id}`: admins only.
pub async fn update_tenant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<TenantInput>,
) -> Result<Json<Tenant>, ApiError> {
    let ctx = TenantContext { membership: membership_for(&state, &auth.user, id).await?, user: auth.user };
    ctx.require(Module::Cadastros, Permission::Admin)?;
    Ok(Json(tenant_svc::update_tenant(&state.pool, id, &body).await?))
}

/// `DELETE /api/cadastros/empresas/{id}`: owner only.
pub async fn delete_tenant(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    let ctx = TenantContext { membership: membership_for(&state, &auth.user, id).await?, user: auth.user };
    ctx.require_owner()?;
    tenant_svc::delete_tenant(&state.pool, id).await?;
    info!(tenant_id = %id, user_id = %ctx.user.id, "tenant deleted by owner");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// USUARIOS
// =============================================================================

/// `GET /api/cadastros/usuarios`
pub async fn list_members(State(state): State<AppState>, ctx: TenantContext) -> Result<Json<Vec<Member>>, ApiError> {
    ctx.require(Module::Cadastros, Permission::View)?;
    Ok(Json(tenant_svc::list_members(&state.pool, ctx.tenant_id()).await?))
}

/// `POST /api/cadastros/usuarios`: add an existing user by e-mail.
pub async fn add_member(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(body): Json<AddMemberInput>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    ctx.require(Module::Cadastros, Permission::Admin)?;
    let member = tenant_svc::add_member(&state.pool, ctx.tenant_id(), &body).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// `PUT /api/cadastros/usuarios/{user_id}`: change role and modules.
pub async fn update_member(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateMemberInput>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Cadastros, Permission::Admin)?;
    tenant_svc::update_member(&state.pool, ctx.tenant_id(), user_id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/cadastros/usuarios/{user_id}`
pub async fn remove_member(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Module::Cadastros, Permission::Admin)?;
    tenant_svc::remove_member(&state.pool, ctx.tenant_id(), user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PERMISSOES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub tenant_id: Uuid,
    pub role: TenantRole,
    pub modules: Vec<ModuleFlags>,
}

/// `GET /api/cadastros/permissoes`: per-module flags for the caller.
pub async fn permissions(ctx: TenantContext) -> Json<PermissionsResponse> {
    Json(PermissionsResponse { tenant_id: ctx.tenant_id(), role: ctx.membership.role, modules: ctx.membership.flags() })
}

#[cfg(test)]
#[path = "tenant_test.rs"]
mod tests;
