//! Tenant service: companies, membership, and permission flags.
//!
//! DESIGN
//! ======
//! A tenant is a customer company; every business record carries its
//! `tenant_id`. Users reach a tenant through `tenant_members`, which holds a
//! role and an optional module allow-list. Roles form a ladder
//! (`viewer` < `editor` < `admin` < `owner`); admins and owners ignore the
//! module allow-list.
//!
//! Exactly one owner exists per tenant: the user who created it. The owner
//! row cannot be demoted or removed through the member endpoints.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::ErrorCode;
use crate::services::auth::normalize_email;
use crate::validate::{FieldError, FieldErrors, ValidationError, normalize_cnpj};

// =============================================================================
// ROLES / MODULES / PERMISSIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantRole {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl TenantRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    View,
    Edit,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Financeiro,
    Contabil,
    Okr,
    Cadastros,
}

impl Module {
    pub const ALL: [Self; 4] = [Self::Financeiro, Self::Contabil, Self::Okr, Self::Cadastros];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Financeiro => "financeiro",
            Self::Contabil => "contabil",
            Self::Okr => "okr",
            Self::Cadastros => "cadastros",
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "financeiro" => Some(Self::Financeiro),
            "contabil" => Some(Self::Contabil),
            "okr" => Some(Self::Okr),
            "cadastros" => Some(Self::Cadastros),
            _ => None,
        }
    }
}

#[must_use]
pub fn role_satisfies(role: TenantRole, permission: Permission) -> bool {
    match permission {
        Permission::View => true,
        Permission::Edit => matches!(role, TenantRole::Editor | TenantRole::Admin | TenantRole::Owner),
        Permission::Admin => matches!(role, TenantRole::Admin | TenantRole::Owner),
    }
}

/// Role check plus module allow-list. `None` modules means all modules.
#[must_use]
pub fn member_allows(role: TenantRole, modules: Option<&[Module]>, module: Module, permission: Permission) -> bool {
    if !role_satisfies(role, permission) {
        return false;
    }
    match role {
        TenantRole::Owner | TenantRole::Admin => true,
        TenantRole::Editor | TenantRole::Viewer => modules.is_none_or(|m| m.contains(&module)),
    }
}

/// The caller's membership in the tenant named by `X-Tenant-Id`.
#[derive(Debug, Clone)]
pub struct Membership {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: TenantRole,
    pub modules: Option<Vec<Module>>,
}

impl Membership {
    #[must_use]
    pub fn allows(&self, module: Module, permission: Permission) -> bool {
        member_allows(self.role, self.modules.as_deref(), module, permission)
    }

    /// Permission flags for every module, for UI gating.
    #[must_use]
    pub fn flags(&self) -> Vec<ModuleFlags> {
        Module::ALL
            .iter()
            .map(|&module| ModuleFlags {
                module,
                can_view: self.allows(module, Permission::View),
                can_edit: self.allows(module, Permission::Edit),
                can_admin: self.allows(module, Permission::Admin),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModuleFlags {
    pub module: Module,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_admin: bool,
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Empresa não encontrada")]
    NotFound(Uuid),
    #[error("Você não tem acesso a esta empresa")]
    NotMember(Uuid),
    #[error("Nenhum usuário cadastrado com o e-mail {0}")]
    UserNotFound(String),
    #[error("Usuário não é membro desta empresa")]
    MemberNotFound(Uuid),
    #[error("Usuário já é membro desta empresa")]
    AlreadyMember,
    #[error("O proprietário da empresa não pode ser alterado ou removido")]
    OwnerImmutable,
    #[error("CNPJ já cadastrado")]
    CnpjTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for TenantError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound(_) => "E_TENANT_NOT_FOUND",
            Self::NotMember(_) => "E_TENANT_FORBIDDEN",
            Self::UserNotFound(_) => "E_USER_NOT_FOUND",
            Self::MemberNotFound(_) => "E_MEMBER_NOT_FOUND",
            Self::AlreadyMember => "E_MEMBER_EXISTS",
            Self::OwnerImmutable => "E_OWNER_IMMUTABLE",
            Self::CnpjTaken => "E_TENANT_CNPJ_TAKEN",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) | Self::UserNotFound(_) | Self::MemberNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotMember(_) => StatusCode::FORBIDDEN,
            Self::AlreadyMember | Self::OwnerImmutable | Self::CnpjTaken => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn fields(&self) -> &[FieldError] {
        match self {
            Self::Validation(v) => &v.fields,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub legal_name: Option<String>,
    pub cnpj: Option<String>,
}

/// A tenant as seen by one of its members.
#[derive(Debug, Clone, Serialize)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    pub cnpj: Option<String>,
    pub role: TenantRole,
}

#[derive(Debug, Deserialize)]
pub struct TenantInput {
    pub name: String,
    pub legal_name: Option<String>,
    pub cnpj: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: TenantRole,
    pub modules: Option<Vec<Module>>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberInput {
    pub email: String,
    pub role: String,
    pub modules: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberInput {
    pub role: String,
    pub modules: Option<Vec<String>>,
}

// =============================================================================
// INPUT NORMALIZATION
// =============================================================================

/// Validate company input and return `(name, legal_name, cnpj_digits)`.
fn normalize_tenant_input(input: &TenantInput) -> Result<(String, Option<String>, Option<String>), ValidationError> {
    let mut errors = FieldErrors::new();
    errors.required("name", &input.name);
    errors.max_len("name", &input.name, 160);
    let cnpj = input.cnpj.as_deref().map(str::trim).filter(|c| !c.is_empty());
    if let Some(cnpj) = cnpj {
        errors.cnpj("cnpj", cnpj);
    }
    errors.into_result()?;

    let legal_name = input
        .legal_name
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    Ok((input.name.trim().to_owned(), legal_name, cnpj.map(normalize_cnpj)))
}

/// Parse an assignable role (anything but `owner`) and module allow-list.
pub(crate) fn parse_role_and_modules(
    role: &str,
    modules: Option<&[String]>,
) -> Result<(TenantRole, Option<Vec<Module>>), ValidationError> {
    let role = match TenantRole::from_str(role) {
        Some(TenantRole::Owner) | None => {
            return Err(ValidationError::single("role", "Perfil inválido (use admin, editor ou viewer)"));
        }
        Some(role) => role,
    };
    let modules = match modules {
        None => None,
        Some(list) => {
            let mut parsed = Vec::with_capacity(list.len());
            for name in list {
                let Some(module) = Module::from_str(name) else {
                    return Err(ValidationError::single("modules", &format!("Módulo desconhecido: {name}")));
                };
                if !parsed.contains(&module) {
                    parsed.push(module);
                }
            }
            Some(parsed)
        }
    };
    Ok((role, modules))
}

fn modules_to_db(modules: Option<&[Module]>) -> Option<Vec<String>> {
    modules.map(|list| list.iter().map(|m| m.as_str().to_owned()).collect())
}

fn modules_from_db(raw: Option<Vec<String>>) -> Option<Vec<Module>> {
    raw.map(|list| list.iter().filter_map(|m| Module::from_str(m)).collect())
}

// =============================================================================
// MEMBERSHIP LOOKUP
// =============================================================================

/// Load the caller's membership in a tenant, if any.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn load_membership(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, sqlx::Error> {
    let row = sqlx::query("SELECT role, modules FROM tenant_members WHERE tenant_id = $1 AND user_id = $2")
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|r| {
        let role: String = r.get("role");
        let role = TenantRole::from_str(&role)?;
        Some(Membership { tenant_id, user_id, role, modules: modules_from_db(r.get("modules")) })
    }))
}

/// Whether `user_id` belongs to the tenant.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn is_member(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tenant_members WHERE tenant_id = $1 AND user_id = $2)")
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

// =============================================================================
// TENANT CRUD
// =============================================================================

/// Create a company; the creator becomes its owner.
///
/// # Errors
///
/// Validation failures, duplicate CNPJ, or database errors.
pub async fn create_tenant(pool: &PgPool, owner_id: Uuid, input: &TenantInput) -> Result<Tenant, TenantError> {
    let (name, legal_name, cnpj) = normalize_tenant_input(input)?;

    let mut tx = pool.begin().await?;
    let id: Uuid = sqlx::query_scalar("INSERT INTO tenants (name, legal_name, cnpj) VALUES ($1, $2, $3) RETURNING id")
        .bind(&name)
        .bind(&legal_name)
        .bind(&cnpj)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| if db::is_unique_violation(&e) { TenantError::CnpjTaken } else { TenantError::Database(e) })?;
    sqlx::query("INSERT INTO tenant_members (tenant_id, user_id, role) VALUES ($1, $2, 'owner')")
        .bind(id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(tenant_id = %id, %owner_id, "tenant created");
    Ok(Tenant { id, name, legal_name, cnpj })
}

/// List the companies a user belongs to, with the user's role in each.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_tenants_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<TenantSummary>, TenantError> {
    let rows = sqlx::query(
        r"SELECT t.id, t.name, t.cnpj, m.role
          FROM tenants t
          JOIN tenant_members m ON m.tenant_id = t.id
          WHERE m.user_id = $1
          ORDER BY t.name ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let role: String = r.get("role");
            Some(TenantSummary {
                id: r.get("id"),
                name: r.get("name"),
                cnpj: r.get("cnpj"),
                role: TenantRole::from_str(&role)?,
            })
        })
        .collect())
}

/// Fetch one company.
///
/// # Errors
///
/// `NotFound` or a database error.
pub async fn get_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Tenant, TenantError> {
    let row = sqlx::query("SELECT id, name, legal_name, cnpj FROM tenants WHERE id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or(TenantError::NotFound(tenant_id))?;

    Ok(Tenant { id: row.get("id"), name: row.get("name"), legal_name: row.get("legal_name"), cnpj: row.get("cnpj") })
}

/// Update company registration data.
///
/// # Errors
///
/// Validation failures, duplicate CNPJ, `NotFound`, or database errors.
pub async fn update_tenant(pool: &PgPool, tenant_id: Uuid, input: &TenantInput) -> Result<Tenant, TenantError> {
    let (name, legal_name, cnpj) = normalize_tenant_input(input)?;
    let result = sqlx::query("UPDATE tenants SET name = $2, legal_name = $3, cnpj = $4 WHERE id = $1")
        .bind(tenant_id)
        .bind(&name)
        .bind(&legal_name)
        .bind(&cnpj)
        .execute(pool)
        .await
        .map_err(|e| if db::is_unique_violation(&e) { TenantError::CnpjTaken } else { TenantError::Database(e) })?;
    if result.rows_affected() == 0 {
        return Err(TenantError::NotFound(tenant_id));
    }
    Ok(Tenant { id: tenant_id, name, legal_name, cnpj })
}

/// Delete a company and, by cascade, every record it owns.
///
/// # Errors
///
/// `NotFound` or a database error.
pub async fn delete_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<(), TenantError> {
    let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
        .bind(tenant_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(TenantError::NotFound(tenant_id));
    }
    info!(%tenant_id, "tenant deleted");
    Ok(())
}

// =============================================================================
// MEMBERS
// =============================================================================

/// List a tenant's members.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_members(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Member>, TenantError> {
    let rows = sqlx::query(
        r"SELECT u.id, u.name, u.email, m.role, m.modules
          FROM tenant_members m
          JOIN users u ON u.id = m.user_id
          WHERE m.tenant_id = $1
          ORDER BY u.name ASC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let role: String = r.get("role");
            Some(Member {
                user_id: r.get("id"),
                name: r.get("name"),
                email: r.get("email"),
                role: TenantRole::from_str(&role)?,
                modules: modules_from_db(r.get("modules")),
            })
        })
        .collect())
}

/// Add an existing user (by e-mail) to the tenant.
///
/// # Errors
///
/// Validation failures, `UserNotFound`, `AlreadyMember`, or database errors.
pub async fn add_member(pool: &PgPool, tenant_id: Uuid, input: &AddMemberInput) -> Result<Member, TenantError> {
    let mut errors = FieldErrors::new();
    errors.email("email", &input.email);
    errors.into_result()?;
    let (role, modules) = parse_role_and_modules(&input.role, input.modules.as_deref())?;

    let email = normalize_email(&input.email);
    let user = sqlx::query("SELECT id, name, email FROM users WHERE lower(email) = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| TenantError::UserNotFound(email.clone()))?;
    let user_id: Uuid = user.get("id");

    sqlx::query("INSERT INTO tenant_members (tenant_id, user_id, role, modules) VALUES ($1, $2, $3, $4)")
        .bind(tenant_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(modules_to_db(modules.as_deref()))
        .execute(pool)
        .await
        .map_err(|e| if db::is_unique_violation(&e) { TenantError::AlreadyMember } else { TenantError::Database(e) })?;

    info!(%tenant_id, %user_id, role = role.as_str(), "member added");
    Ok(Member { user_id, name: user.get("name"), email: user.get("email"), role, modules })
}

/// Change a member's role and module allow-list. The owner is immutable.
///
/// # Errors
///
/// Validation failures, `MemberNotFound`, `OwnerImmutable`, or database errors.
pub async fn update_member(
    pool: &PgPool,
    tenant_id: Uuid,
    user_id: Uuid,
    input: &UpdateMemberInput,
) -> Result<(), TenantError> {
    let (role, modules) = parse_role_and_modules(&input.role, input.modules.as_deref())?;
    ensure_not_owner(pool, tenant_id, user_id).await?;

    sqlx::query("UPDATE tenant_members SET role = $3, modules = $4 WHERE tenant_id = $1 AND user_id = $2")
        .bind(tenant_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(modules_to_db(modules.as_deref()))
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a member. The owner cannot be removed.
///
/// # Errors
///
/// `MemberNotFound`, `OwnerImmutable`, or database errors.
pub async fn remove_member(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> Result<(), TenantError> {
    ensure_not_owner(pool, tenant_id, user_id).await?;
    sqlx::query("DELETE FROM tenant_members WHERE tenant_id = $1 AND user_id = $2")
        .bind(tenant_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    info!(%tenant_id, %user_id, "member removed");
    Ok(())
}

async fn ensure_not_owner(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> Result<(), TenantError> {
    let membership = load_membership(pool, tenant_id, user_id)
        .await?
        .ok_or(TenantError::MemberNotFound(user_id))?;
    if membership.role == TenantRole::Owner {
        return Err(TenantError::OwnerImmutable);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tenant_test.rs"]
mod tests;
