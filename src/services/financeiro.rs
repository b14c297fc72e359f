//! Financial module: bank accounts, movements (`movimentações`), summary.
//!
//! DESIGN
//! ======
//! A movement is a revenue (`receita`) or expense (`despesa`) against one
//! bank account. Its lifecycle is `pendente` → `pago` (settled with a paid
//! date) or `pendente` → `cancelado`. Only `pago` movements count towards a
//! bank account balance; cancelled ones count nowhere.
//!
//! Amounts are positive integer cents; the kind carries the sign.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use time::Date;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::ErrorCode;
use crate::format::{de, format_brl, format_date_br, today};
use crate::listing::ListParams;
use crate::services::cadastros::cost_center_is_active;
use crate::validate::{FieldError, FieldErrors, ValidationError};

const MOVEMENT_COLUMNS: &str =
    "id, kind, description, category, amount_cents, due_date, paid_date, status, bank_account_id, cost_center_id";
const BANK_ACCOUNT_COLUMNS: &str = "id, name, bank_name, agency, account_number, initial_balance_cents, active";

// =============================================================================
// ENUMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Receita,
    Despesa,
}

impl MovementKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Receita => "receita",
            Self::Despesa => "despesa",
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "receita" => Some(Self::Receita),
            "despesa" => Some(Self::Despesa),
            _ => None,
        }
    }

    /// Effect of `amount_cents` on a bank balance.
    #[must_use]
    pub fn signed(self, amount_cents: i64) -> i64 {
        match self {
            Self::Receita => amount_cents,
            Self::Despesa => -amount_cents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Pendente,
    Pago,
    Cancelado,
}

impl MovementStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Pago => "pago",
            Self::Cancelado => "cancelado",
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pendente" => Some(Self::Pendente),
            "pago" => Some(Self::Pago),
            "cancelado" => Some(Self::Cancelado),
            _ => None,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FinanceiroError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Conta bancária não encontrada")]
    BankAccountNotFound(Uuid),
    #[error("Conta bancária possui movimentações e não pode ser excluída")]
    BankAccountInUse(Uuid),
    #[error("Movimentação não encontrada")]
    MovementNotFound(Uuid),
    #[error("Apenas movimentações pendentes podem ser alteradas, baixadas ou canceladas")]
    NotPending(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for FinanceiroError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::BankAccountNotFound(_) => "E_BANK_ACCOUNT_NOT_FOUND",
            Self::BankAccountInUse(_) => "E_BANK_ACCOUNT_IN_USE",
            Self::MovementNotFound(_) => "E_MOVEMENT_NOT_FOUND",
            Self::NotPending(_) => "E_MOVEMENT_NOT_PENDING",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BankAccountNotFound(_) | Self::MovementNotFound(_) => StatusCode::NOT_FOUND,
            Self::BankAccountInUse(_) | Self::NotPending(_) => StatusCode::CONFLICT,
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

// =============================================================================
// BANK ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BankAccount {
    pub id: Uuid,
    pub name: String,
    pub bank_name: Option<String>,
    pub agency: Option<String>,
    pub account_number: Option<String>,
    pub initial_balance_cents: i64,
    pub initial_balance_formatted: String,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct BankAccountInput {
    pub name: String,
    pub bank_name: Option<String>,
    pub agency: Option<String>,
    pub account_number: Option<String>,
    #[serde(default, deserialize_with = "de::option_cents")]
    pub initial_balance_cents: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Balance {
    pub bank_account_id: Uuid,
    pub until: Option<Date>,
    pub balance_cents: i64,
    pub balance_formatted: String,
}

fn bank_account_from_row(r: &PgRow) -> BankAccount {
    let initial_balance_cents: i64 = r.get("initial_balance_cents");
    BankAccount {
        id: r.get("id"),
        name: r.get("name"),
        bank_name: r.get("bank_name"),
        agency: r.get("agency"),
        account_number: r.get("account_number"),
        initial_balance_cents,
        initial_balance_formatted: format_brl(initial_balance_cents),
        active: r.get("active"),
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn validate_bank_account(input: &BankAccountInput) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    errors.required("name", &input.name);
    errors.max_len("name", &input.name, 120);
    errors.into_result()
}

/// List bank accounts, ordered by name.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_bank_accounts(pool: &PgPool, tenant_id: Uuid, params: &ListParams) -> Result<Vec<BankAccount>, FinanceiroError> {
    let mut builder = QueryBuilder::new(format!("SELECT {BANK_ACCOUNT_COLUMNS} FROM bank_accounts WHERE tenant_id = "));
    builder.push_bind(tenant_id);
    if let Some(pattern) = params.search_pattern() {
        builder.push(" AND (name ILIKE ").push_bind(pattern.clone());
        builder.push(" OR bank_name ILIKE ").push_bind(pattern).push(")");
    }
    builder.push(" ORDER BY name ASC LIMIT ").push_bind(params.limit);
    builder.push(" OFFSET ").push_bind(params.offset);

    let rows = builder.build().fetch_all(pool).await?;
    Ok(rows.iter().map(bank_account_from_row).collect())
}

/// Fetch one bank account.
///
/// # Errors
///
/// `BankAccountNotFound` or a database error.
pub async fn get_bank_account(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<BankAccount, FinanceiroError> {
    let row = sqlx::query(&format!("SELECT {BANK_ACCOUNT_COLUMNS} FROM bank_accounts WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(FinanceiroError::BankAccountNotFound(id))?;
    Ok(bank_account_from_row(&row))
}

/// Create a bank account.
///
/// # Errors
///
/// Validation failures or database errors.
pub async fn create_bank_account(pool: &PgPool, tenant_id: Uuid, input: &BankAccountInput) -> Result<BankAccount, FinanceiroError> {
    validate_bank_account(input)?;
    let row = sqlx::query(&format!(
        "INSERT INTO bank_accounts (tenant_id, name, bank_name, agency, account_number, initial_balance_cents, active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {BANK_ACCOUNT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(input.name.trim())
    .bind(trimmed(input.bank_name.as_deref()))
    .bind(trimmed(input.agency.as_deref()))
    .bind(trimmed(input.account_number.as_deref()))
    .bind(input.initial_balance_cents.unwrap_or(0))
    .bind(input.active.unwrap_or(true))
    .fetch_one(pool)
    .await?;

    let account = bank_account_from_row(&row);
    info!(%tenant_id, bank_account_id = %account.id, "bank account created");
    Ok(account)
}

/// Update a bank account.
///
/// # Errors
///
/// Validation failures, `BankAccountNotFound`, or database errors.
pub async fn update_bank_account(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    input: &BankAccountInput,
) -> Result<BankAccount, FinanceiroError> {
    validate_bank_account(input)?;
    let row = sqlx::query(&format!(
        "UPDATE bank_accounts
         SET name = $3, bank_name = $4, agency = $5, account_number = $6, initial_balance_cents = $7, active = $8
         WHERE tenant_id = $1 AND id = $2
         RETURNING {BANK_ACCOUNT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(input.name.trim())
    .bind(trimmed(input.bank_name.as_deref()))
    .bind(trimmed(input.agency.as_deref()))
    .bind(trimmed(input.account_number.as_deref()))
    .bind(input.initial_balance_cents.unwrap_or(0))
    .bind(input.active.unwrap_or(true))
    .fetch_optional(pool)
    .await?
    .ok_or(FinanceiroError::BankAccountNotFound(id))?;
    Ok(bank_account_from_row(&row))
}

/// Delete a bank account without movements.
///
/// # Errors
///
/// `BankAccountInUse`, `BankAccountNotFound`, or database errors.
pub async fn delete_bank_account(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), FinanceiroError> {
    let result = sqlx::query("DELETE FROM bank_accounts WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            if db::is_foreign_key_violation(&e) {
                FinanceiroError::BankAccountInUse(id)
            } else {
                FinanceiroError::Database(e)
            }
        })?;
    if result.rows_affected() == 0 {
        return Err(FinanceiroError::BankAccountNotFound(id));
    }
    info!(%tenant_id, bank_account_id = %id, "bank account deleted");
    Ok(())
}

/// Balance of a bank account: initial balance plus settled movements,
/// optionally only those paid on or before `until`.
///
/// # Errors
///
/// `BankAccountNotFound` or a database error.
pub async fn bank_account_balance(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    until: Option<Date>,
) -> Result<Balance, FinanceiroError> {
    let row = sqlx::query(
        r"SELECT b.initial_balance_cents,
                 COALESCE(SUM(CASE WHEN m.kind = 'receita' THEN m.amount_cents ELSE -m.amount_cents END)
                          FILTER (WHERE m.status = 'pago' AND ($3::date IS NULL OR m.paid_date <= $3)), 0)::BIGINT
                     AS settled_cents
          FROM bank_accounts b
          LEFT JOIN movements m ON m.bank_account_id = b.id
          WHERE b.tenant_id = $1 AND b.id = $2
          GROUP BY b.id",
    )
    .bind(tenant_id)
    .bind(id)
    .bind(until)
    .fetch_optional(pool)
    .await?
    .ok_or(FinanceiroError::BankAccountNotFound(id))?;

    let balance_cents = row
        .get::<i64, _>("initial_balance_cents")
        .saturating_add(row.get::<i64, _>("settled_cents"));
    Ok(Balance { bank_account_id: id, until, balance_cents, balance_formatted: format_brl(balance_cents) })
}

// =============================================================================
// MOVEMENTS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    pub description: String,
    pub category: Option<String>,
    pub amount_cents: i64,
    pub amount_formatted: String,
    pub due_date: Date,
    pub due_date_formatted: String,
    pub paid_date: Option<Date>,
    pub status: MovementStatus,
    pub bank_account_id: Uuid,
    pub cost_center_id: Option<Uuid>,
    /// Pending and past its due date.
    pub overdue: bool,
}

#[derive(Debug, Deserialize)]
pub struct MovementInput {
    pub kind: String,
    pub description: String,
    pub category: Option<String>,
    #[serde(deserialize_with = "de::cents")]
    pub amount_cents: i64,
    #[serde(deserialize_with = "de::date")]
    pub due_date: Date,
    #[serde(default, deserialize_with = "de::option_date")]
    pub paid_date: Option<Date>,
    pub status: Option<String>,
    pub bank_account_id: Uuid,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub bank_account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettleInput {
    #[serde(default, deserialize_with = "de::option_date")]
    pub paid_date: Option<Date>,
}

/// Validated movement fields ready for binding.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MovementFields {
    pub kind: MovementKind,
    pub status: MovementStatus,
    pub paid_date: Option<Date>,
}

#[must_use]
pub fn is_overdue(status: MovementStatus, due_date: Date, today: Date) -> bool {
    status == MovementStatus::Pendente && due_date < today
}

/// Form checks for a movement. A paid date is kept only for `pago`.
pub(crate) fn validate_movement(input: &MovementInput) -> Result<MovementFields, ValidationError> {
    let mut errors = FieldErrors::new();
    let kind = MovementKind::from_str(&input.kind);
    if kind.is_none() {
        errors.push("kind", "Tipo inválido (use receita ou despesa)");
    }
    let status = match input.status.as_deref() {
        None => Some(MovementStatus::Pendente),
        Some(raw) => MovementStatus::from_str(raw),
    };
    if status.is_none() {
        errors.push("status", "Situação inválida (use pendente, pago ou cancelado)");
    }
    errors.required("description", &input.description);
    errors.max_len("description", &input.description, 200);
    errors.positive_amount("amount_cents", input.amount_cents);
    if status == Some(MovementStatus::Pago) && input.paid_date.is_none() {
        errors.push("paid_date", "Informe a data de pagamento");
    }
    errors.into_result()?;

    let (Some(kind), Some(status)) = (kind, status) else {
        return Err(ValidationError::single("kind", "Tipo inválido"));
    };
    let paid_date = if status == MovementStatus::Pago { input.paid_date } else { None };
    Ok(MovementFields { kind, status, paid_date })
}

/// Parse the optional `kind` / `status` list filters.
pub(crate) fn parse_movement_filter(
    filter: &MovementFilter,
) -> Result<(Option<MovementKind>, Option<MovementStatus>), ValidationError> {
    let kind = match filter.kind.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(MovementKind::from_str(raw).ok_or_else(|| ValidationError::single("kind", "Tipo inválido"))?),
    };
    let status = match filter.status.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            Some(MovementStatus::from_str(raw).ok_or_else(|| ValidationError::single("status", "Situação inválida"))?)
        }
    };
    Ok((kind, status))
}

fn movement_from_row(r: &PgRow, today: Date) -> Result<Movement, sqlx::Error> {
    let kind: String = r.get("kind");
    let status: String = r.get("status");
    let kind = MovementKind::from_str(&kind).ok_or_else(|| db::decode_error("kind", &kind))?;
    let status = MovementStatus::from_str(&status).ok_or_else(|| db::decode_error("status", &status))?;
    let amount_cents: i64 = r.get("amount_cents");
    let due_date: Date = r.get("due_date");
    Ok(Movement {
        id: r.get("id"),
        kind,
        description: r.get("description"),
        category: r.get("category"),
        amount_cents,
        amount_formatted: format_brl(amount_cents),
        due_date,
        due_date_formatted: format_date_br(due_date),
        paid_date: r.get("paid_date"),
        status,
        bank_account_id: r.get("bank_account_id"),
        cost_center_id: r.get("cost_center_id"),
        overdue: is_overdue(status, due_date, today),
    })
}

async fn check_movement_references(pool: &PgPool, tenant_id: Uuid, input: &MovementInput) -> Result<(), FinanceiroError> {
    let mut errors = FieldErrors::new();
    let bank_ok: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bank_accounts WHERE tenant_id = $1 AND id = $2 AND active)")
            .bind(tenant_id)
            .bind(input.bank_account_id)
            .fetch_one(pool)
            .await?;
    if !bank_ok {
        errors.push("bank_account_id", "Conta bancária inválida ou inativa");
    }
    if let Some(cost_center_id) = input.cost_center_id {
        if !cost_center_is_active(pool, tenant_id, cost_center_id).await? {
            errors.push("cost_center_id", "Centro de custo inválido ou inativo");
        }
    }
    errors.into_result()?;
    Ok(())
}

/// List movements matching the filters, ordered by due date.
///
/// # Errors
///
/// Invalid filter values or database errors.
pub async fn list_movements(
    pool: &PgPool,
    tenant_id: Uuid,
    params: &ListParams,
    filter: &MovementFilter,
) -> Result<Vec<Movement>, FinanceiroError> {
    let (kind, status) = parse_movement_filter(filter)?;

    let mut builder = QueryBuilder::new(format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE tenant_id = "));
    builder.push_bind(tenant_id);
    if let Some(kind) = kind {
        builder.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(status) = status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(bank_account_id) = filter.bank_account_id {
        builder.push(" AND bank_account_id = ").push_bind(bank_account_id);
    }
    if let Some(cost_center_id) = filter.cost_center_id {
        builder.push(" AND cost_center_id = ").push_bind(cost_center_id);
    }
    if let Some(from) = params.from {
        builder.push(" AND due_date >= ").push_bind(from);
    }
    if let Some(to) = params.to {
        builder.push(" AND due_date <= ").push_bind(to);
    }
    if let Some(pattern) = params.search_pattern() {
        builder.push(" AND description ILIKE ").push_bind(pattern);
    }
    builder.push(" ORDER BY due_date ASC, created_at ASC LIMIT ").push_bind(params.limit);
    builder.push(" OFFSET ").push_bind(params.offset);

    let rows = builder.build().fetch_all(pool).await?;
    let today = today();
    let movements = rows
        .iter()
        .map(|r| movement_from_row(r, today))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(movements)
}

/// Fetch one movement.
///
/// # Errors
///
/// `MovementNotFound` or a database error.
pub async fn get_movement(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Movement, FinanceiroError> {
    let row = sqlx::query(&format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(FinanceiroError::MovementNotFound(id))?;
    Ok(movement_from_row(&row, today())?)
}

/// Create a movement.
///
/// # Errors
///
/// Validation failures (including unknown references) or database errors.
pub async fn create_movement(
    pool: &PgPool,
    tenant_id: Uuid,
    created_by: Uuid,
    input: &MovementInput,
) -> Result<Movement, FinanceiroError> {
    let fields = validate_movement(input)?;
    check_movement_references(pool, tenant_id, input).await?;

    let row = sqlx::query(&format!(
        "INSERT INTO movements
             (tenant_id, kind, description, category, amount_cents, due_date, paid_date, status,
              bank_account_id, cost_center_id, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {MOVEMENT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(fields.kind.as_str())
    .bind(input.description.trim())
    .bind(trimmed(input.category.as_deref()))
    .bind(input.amount_cents)
    .bind(input.due_date)
    .bind(fields.paid_date)
    .bind(fields.status.as_str())
    .bind(input.bank_account_id)
    .bind(input.cost_center_id)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    let movement = movement_from_row(&row, today())?;
    info!(%tenant_id, movement_id = %movement.id, kind = fields.kind.as_str(), "movement created");
    Ok(movement)
}

/// Status changes on edit go through settle/cancel instead.
pub(crate) fn check_edit_status(fields: &MovementFields) -> Result<(), ValidationError> {
    if fields.status == MovementStatus::Pendente {
        return Ok(());
    }
    Err(ValidationError::single("status", "Use a baixa ou o cancelamento para mudar a situação"))
}

/// Replace a pending movement's fields.
///
/// # Errors
///
/// Validation failures, `NotPending` once settled or cancelled,
/// `MovementNotFound`, or database errors.
pub async fn update_movement(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    input: &MovementInput,
) -> Result<Movement, FinanceiroError> {
    let fields = validate_movement(input)?;
    check_edit_status(&fields)?;
    check_movement_references(pool, tenant_id, input).await?;

    let row = sqlx::query(&format!(
        "UPDATE movements
         SET kind = $3, description = $4, category = $5, amount_cents = $6, due_date = $7,
             bank_account_id = $8, cost_center_id = $9
         WHERE tenant_id = $1 AND id = $2 AND status = 'pendente'
         RETURNING {MOVEMENT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(fields.kind.as_str())
    .bind(input.description.trim())
    .bind(trimmed(input.category.as_deref()))
    .bind(input.amount_cents)
    .bind(input.due_date)
    .bind(input.bank_account_id)
    .bind(input.cost_center_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        get_movement(pool, tenant_id, id).await?;
        return Err(FinanceiroError::NotPending(id));
    };
    Ok(movement_from_row(&row, today())?)
}

/// Delete a movement.
///
/// # Errors
///
/// `MovementNotFound` or a database error.
pub async fn delete_movement(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), FinanceiroError> {
    let result = sqlx::query("DELETE FROM movements WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(FinanceiroError::MovementNotFound(id));
    }
    info!(%tenant_id, movement_id = %id, "movement deleted");
    Ok(())
}

/// Settle a pending movement (`baixa`). Defaults the paid date to today.
///
/// # Errors
///
/// `NotPending`, `MovementNotFound`, or database errors.
pub async fn settle_movement(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    paid_date: Option<Date>,
) -> Result<Movement, FinanceiroError> {
    let paid_date = paid_date.unwrap_or_else(today);
    transition_pending(pool, tenant_id, id, MovementStatus::Pago, Some(paid_date)).await
}

/// Cancel a pending movement.
///
/// # Errors
///
/// `NotPending`, `MovementNotFound`, or database errors.
pub async fn cancel_movement(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Movement, FinanceiroError> {
    transition_pending(pool, tenant_id, id, MovementStatus::Cancelado, None).await
}

async fn transition_pending(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    status: MovementStatus,
    paid_date: Option<Date>,
) -> Result<Movement, FinanceiroError> {
    let row = sqlx::query(&format!(
        "UPDATE movements SET status = $3, paid_date = $4
         WHERE tenant_id = $1 AND id = $2 AND status = 'pendente'
         RETURNING {MOVEMENT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(status.as_str())
    .bind(paid_date)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            info!(%tenant_id, movement_id = %id, status = status.as_str(), "movement transitioned");
            Ok(movement_from_row(&row, today())?)
        }
        None => {
            // Distinguish a missing row from one that is no longer pending.
            get_movement(pool, tenant_id, id).await?;
            Err(FinanceiroError::NotPending(id))
        }
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub revenue_paid_cents: i64,
    pub revenue_pending_cents: i64,
    pub expense_paid_cents: i64,
    pub expense_pending_cents: i64,
    /// Paid revenues minus paid expenses.
    pub balance_cents: i64,
    pub revenue_paid_formatted: String,
    pub revenue_pending_formatted: String,
    pub expense_paid_formatted: String,
    pub expense_pending_formatted: String,
    pub balance_formatted: String,
}

/// Fold `(kind, status, total)` groups into a summary. Cancelled groups are ignored.
#[must_use]
pub fn summarize(from: Option<Date>, to: Option<Date>, groups: &[(MovementKind, MovementStatus, i64)]) -> Summary {
    let mut summary = Summary { from, to, ..Summary::default() };
    for &(kind, status, total) in groups {
        let slot = match (kind, status) {
            (MovementKind::Receita, MovementStatus::Pago) => &mut summary.revenue_paid_cents,
            (MovementKind::Receita, MovementStatus::Pendente) => &mut summary.revenue_pending_cents,
            (MovementKind::Despesa, MovementStatus::Pago) => &mut summary.expense_paid_cents,
            (MovementKind::Despesa, MovementStatus::Pendente) => &mut summary.expense_pending_cents,
            (_, MovementStatus::Cancelado) => continue,
        };
        *slot = slot.saturating_add(total);
    }
    summary.balance_cents = summary.revenue_paid_cents.saturating_sub(summary.expense_paid_cents);
    summary.revenue_paid_formatted = format_brl(summary.revenue_paid_cents);
    summary.revenue_pending_formatted = format_brl(summary.revenue_pending_cents);
    summary.expense_paid_formatted = format_brl(summary.expense_paid_cents);
    summary.expense_pending_formatted = format_brl(summary.expense_pending_cents);
    summary.balance_formatted = format_brl(summary.balance_cents);
    summary
}

/// Totals for the period. Paid movements are dated by `paid_date`, pending
/// ones by `due_date`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn summary(pool: &PgPool, tenant_id: Uuid, from: Option<Date>, to: Option<Date>) -> Result<Summary, FinanceiroError> {
    let mut builder = QueryBuilder::new(
        "SELECT kind, status, COALESCE(SUM(amount_cents), 0)::BIGINT AS total
         FROM movements
         WHERE status <> 'cancelado' AND tenant_id = ",
    );
    builder.push_bind(tenant_id);
    if let Some(from) = from {
        builder
            .push(" AND (CASE WHEN status = 'pago' THEN paid_date ELSE due_date END) >= ")
            .push_bind(from);
    }
    if let Some(to) = to {
        builder
            .push(" AND (CASE WHEN status = 'pago' THEN paid_date ELSE due_date END) <= ")
            .push_bind(to);
    }
    builder.push(" GROUP BY kind, status");

    let rows = builder.build().fetch_all(pool).await?;
    let mut groups = Vec::with_capacity(rows.len());
    for r in &rows {
        let kind: String = r.get("kind");
        let status: String = r.get("status");
        let kind = MovementKind::from_str(&kind).ok_or_else(|| db::decode_error("kind", &kind))?;
        let status = MovementStatus::from_str(&status).ok_or_else(|| db::decode_error("status", &status))?;
        groups.push((kind, status, r.get::<i64, _>("total")));
    }
    Ok(summarize(from, to, &groups))
}

#[cfg(test)]
#[path = "financeiro_test.rs"]
mod tests;
