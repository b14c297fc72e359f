//! Cost centers (`centros de custo`) shared by the ledger and financial modules.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::ErrorCode;
use crate::listing::ListParams;
use crate::validate::{FieldError, FieldErrors, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum CadastroError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Centro de custo não encontrado")]
    NotFound(Uuid),
    #[error("Já existe um centro de custo com o código {0}")]
    CodeTaken(String),
    #[error("Centro de custo em uso por lançamentos ou movimentações")]
    InUse(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for CadastroError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound(_) => "E_COST_CENTER_NOT_FOUND",
            Self::CodeTaken(_) => "E_COST_CENTER_CODE_TAKEN",
            Self::InUse(_) => "E_COST_CENTER_IN_USE",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CodeTaken(_) | Self::InUse(_) => StatusCode::CONFLICT,
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
pub struct CostCenter {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CostCenterInput {
    pub code: String,
    pub name: String,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CostCenterFilter {
    pub active: Option<bool>,
}

fn validate_input(input: &CostCenterInput) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    errors.required("code", &input.code);
    errors.max_len("code", &input.code, 20);
    errors.required("name", &input.name);
    errors.max_len("name", &input.name, 120);
    errors.into_result()
}

fn from_row(r: &PgRow) -> CostCenter {
    CostCenter { id: r.get("id"), code: r.get("code"), name: r.get("name"), active: r.get("active") }
}

fn map_write_error(err: sqlx::Error, code: &str) -> CadastroError {
    if db::is_unique_violation(&err) {
        CadastroError::CodeTaken(code.to_owned())
    } else {
        CadastroError::Database(err)
    }
}

/// List cost centers, ordered by code.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_cost_centers(
    pool: &PgPool,
    tenant_id: Uuid,
    params: &ListParams,
    filter: &CostCenterFilter,
) -> Result<Vec<CostCenter>, CadastroError> {
    let mut builder = QueryBuilder::new("SELECT id, code, name, active FROM cost_centers WHERE tenant_id = ");
    builder.push_bind(tenant_id);
    if let Some(active) = filter.active {
        builder.push(" AND active = ").push_bind(active);
    }
    if let Some(pattern) = params.search_pattern() {
        builder.push(" AND (code ILIKE ").push_bind(pattern.clone());
        builder.push(" OR name ILIKE ").push_bind(pattern).push(")");
    }
    builder.push(" ORDER BY code ASC LIMIT ").push_bind(params.limit);
    builder.push(" OFFSET ").push_bind(params.offset);

    let rows = builder.build().fetch_all(pool).await?;
    Ok(rows.iter().map(from_row).collect())
}

/// Fetch one cost center.
///
/// # Errors
///
/// `NotFound` or a database error.
pub async fn get_cost_center(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<CostCenter, CadastroError> {
    let row = sqlx::query("SELECT id, code, name, active FROM cost_centers WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(CadastroError::NotFound(id))?;
    Ok(from_row(&row))
}

/// Create a cost center.
///
/// # Errors
///
/// Validation failures, duplicate code, or database errors.
pub async fn create_cost_center(pool: &PgPool, tenant_id: Uuid, input: &CostCenterInput) -> Result<CostCenter, CadastroError> {
    validate_input(input)?;
    let code = input.code.trim();
    let row = sqlx::query(
        "INSERT INTO cost_centers (tenant_id, code, name, active) VALUES ($1, $2, $3, $4)
         RETURNING id, code, name, active",
    )
    .bind(tenant_id)
    .bind(code)
    .bind(input.name.trim())
    .bind(input.active.unwrap_or(true))
    .fetch_one(pool)
    .await
    .map_err(|e| map_write_error(e, code))?;

    let center = from_row(&row);
    info!(%tenant_id, cost_center_id = %center.id, "cost center created");
    Ok(center)
}

/// Update a cost center.
///
/// # Errors
///
/// Validation failures, duplicate code, `NotFound`, or database errors.
pub async fn update_cost_center(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    input: &CostCenterInput,
) -> Result<CostCenter, CadastroError> {
    validate_input(input)?;
    let code = input.code.trim();
    let row = sqlx::query(
        "UPDATE cost_centers SET code = $3, name = $4, active = $5
         WHERE tenant_id = $1 AND id = $2
         RETURNING id, code, name, active",
    )
    .bind(tenant_id)
    .bind(id)
    .bind(code)
    .bind(input.name.trim())
    .bind(input.active.unwrap_or(true))
    .fetch_optional(pool)
    .await
    .map_err(|e| map_write_error(e, code))?
    .ok_or(CadastroError::NotFound(id))?;
    Ok(from_row(&row))
}

/// Delete a cost center that nothing references.
///
/// # Errors
///
/// `InUse`, `NotFound`, or database errors.
pub async fn delete_cost_center(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), CadastroError> {
    let result = sqlx::query("DELETE FROM cost_centers WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| if db::is_foreign_key_violation(&e) { CadastroError::InUse(id) } else { CadastroError::Database(e) })?;
    if result.rows_affected() == 0 {
        return Err(CadastroError::NotFound(id));
    }
    info!(%tenant_id, cost_center_id = %id, "cost center deleted");
    Ok(())
}

/// Whether an active cost center with this id exists in the tenant.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn cost_center_is_active(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cost_centers WHERE tenant_id = $1 AND id = $2 AND active)")
        .bind(tenant_id)
        .bind(id)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
#[path = "cadastros_test.rs"]
mod tests;
