//! Accounting module: chart of accounts, ledger entries, trial balance, and
//! account ledger (`razão`).
//!
//! DESIGN
//! ======
//! Accounts form a tree keyed by dotted codes (`1`, `1.1`, `1.1.01`). Only
//! analytic accounts receive entries; synthetic accounts exist to group and
//! roll up their descendants. A child's code always extends its parent's
//! code, so roll-up can be done by code prefix without walking `parent_id`.
//!
//! Every ledger entry moves one amount from a credit account to a debit
//! account, so debits and credits over analytic accounts always balance.
//!
//! Balances are signed by the account's nature: debit-nature accounts
//! (`ativo`, `despesa`) grow with debits, all others grow with credits.

use std::collections::HashSet;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use time::Date;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::ErrorCode;
use crate::format::{de, format_brl};
use crate::listing::ListParams;
use crate::services::cadastros::cost_center_is_active;
use crate::validate::{FieldError, FieldErrors, MSG_SAME_ACCOUNT, ValidationError};

const ACCOUNT_COLUMNS: &str = "id, code, name, kind, analytic, parent_id, active";
const ENTRY_COLUMNS: &str =
    "id, entry_date, debit_account_id, credit_account_id, amount_cents, history, document, cost_center_id";

// =============================================================================
// ACCOUNT KINDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Ativo,
    Passivo,
    PatrimonioLiquido,
    Receita,
    Despesa,
}

impl AccountKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ativo => "ativo",
            Self::Passivo => "passivo",
            Self::PatrimonioLiquido => "patrimonio_liquido",
            Self::Receita => "receita",
            Self::Despesa => "despesa",
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "ativo" => Some(Self::Ativo),
            "passivo" => Some(Self::Passivo),
            "patrimonio_liquido" => Some(Self::PatrimonioLiquido),
            "receita" => Some(Self::Receita),
            "despesa" => Some(Self::Despesa),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_debit_nature(self) -> bool {
        matches!(self, Self::Ativo | Self::Despesa)
    }

    /// Balance of `debit` and `credit` totals in this kind's nature.
    #[must_use]
    pub fn balance(self, debit_cents: i64, credit_cents: i64) -> i64 {
        if self.is_debit_nature() {
            debit_cents.saturating_sub(credit_cents)
        } else {
            credit_cents.saturating_sub(debit_cents)
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContabilError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    SameAccount(ValidationError),
    #[error("Conta contábil não encontrada")]
    AccountNotFound(Uuid),
    #[error("Lançamento não encontrado")]
    EntryNotFound(Uuid),
    #[error("Já existe uma conta com o código {0}")]
    CodeTaken(String),
    #[error("Conta possui subcontas ou lançamentos e não pode ser excluída")]
    AccountInUse(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for ContabilError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::SameAccount(_) => "E_LEDGER_SAME_ACCOUNT",
            Self::AccountNotFound(_) => "E_ACCOUNT_NOT_FOUND",
            Self::EntryNotFound(_) => "E_LEDGER_ENTRY_NOT_FOUND",
            Self::CodeTaken(_) => "E_ACCOUNT_CODE_TAKEN",
            Self::AccountInUse(_) => "E_ACCOUNT_IN_USE",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::SameAccount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AccountNotFound(_) | Self::EntryNotFound(_) => StatusCode::NOT_FOUND,
            Self::CodeTaken(_) | Self::AccountInUse(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn fields(&self) -> &[FieldError] {
        match self {
            Self::Validation(v) | Self::SameAccount(v) => &v.fields,
            _ => &[],
        }
    }
}

// =============================================================================
// CHART OF ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub analytic: bool,
    pub parent_id: Option<Uuid>,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AccountInput {
    pub code: String,
    pub name: String,
    pub kind: String,
    pub analytic: Option<bool>,
    pub parent_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountFilter {
    pub kind: Option<String>,
    pub analytic: Option<bool>,
    pub active: Option<bool>,
}

fn account_from_row(r: &PgRow) -> Result<Account, sqlx::Error> {
    let kind: String = r.get("kind");
    Ok(Account {
        id: r.get("id"),
        code: r.get("code"),
        name: r.get("name"),
        kind: AccountKind::from_str(&kind).ok_or_else(|| db::decode_error("kind", &kind))?,
        analytic: r.get("analytic"),
        parent_id: r.get("parent_id"),
        active: r.get("active"),
    })
}

pub(crate) fn validate_account(input: &AccountInput) -> Result<AccountKind, ValidationError> {
    let mut errors = FieldErrors::new();
    if input.code.trim().is_empty() {
        errors.required("code", &input.code);
    } else {
        errors.account_code("code", input.code.trim());
    }
    errors.required("name", &input.name);
    errors.max_len("name", &input.name, 120);
    let kind = AccountKind::from_str(&input.kind);
    if kind.is_none() {
        errors.push("kind", "Tipo de conta inválido");
    }
    errors.into_result()?;
    kind.ok_or_else(|| ValidationError::single("kind", "Tipo de conta inválido"))
}

/// Structural rules between a child account and its parent.
pub(crate) fn check_parent(parent: &Account, child_code: &str, child_kind: AccountKind) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    if parent.analytic {
        errors.push("parent_id", "A conta superior deve ser sintética");
    }
    if parent.kind != child_kind {
        errors.push("kind", "O tipo deve ser igual ao da conta superior");
    }
    if !is_descendant_code(&parent.code, child_code) {
        errors.push("code", "O código deve começar com o código da conta superior");
    }
    errors.into_result()
}

/// `child` sits strictly below `ancestor` in the code hierarchy.
#[must_use]
pub fn is_descendant_code(ancestor: &str, child: &str) -> bool {
    child.len() > ancestor.len() + 1 && child.starts_with(ancestor) && child.as_bytes()[ancestor.len()] == b'.'
}

fn map_account_write_error(err: sqlx::Error, code: &str) -> ContabilError {
    if db::is_unique_violation(&err) {
        ContabilError::CodeTaken(code.to_owned())
    } else {
        ContabilError::Database(err)
    }
}

async fn find_account(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(account_from_row).transpose()
}

async fn load_chart(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Account>, sqlx::Error> {
    let rows = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = $1 ORDER BY code"))
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(account_from_row).collect()
}

/// Where a created or edited account wants to sit in the chart.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement<'a> {
    pub code: &'a str,
    pub kind: AccountKind,
    pub analytic: bool,
    pub parent_id: Option<Uuid>,
}

/// Closest synthetic account whose code is a prefix of `code`.
pub(crate) fn nearest_synthetic_ancestor<'a>(accounts: &[&'a Account], code: &str) -> Option<&'a Account> {
    accounts
        .iter()
        .copied()
        .filter(|a| !a.analytic && is_descendant_code(&a.code, code))
        .max_by_key(|a| a.code.len())
}

/// Keeps the prefix tree and the `parent_id` links in agreement.
///
/// `chart` is every account of the tenant; `current` is the stored row when
/// editing. Roll-ups in the trial balance follow code prefixes, so a code
/// that lands under a synthetic account must be linked to the closest one,
/// and a synthetic account may not appear above rows linked elsewhere.
pub(crate) fn check_hierarchy(
    chart: &[Account],
    current: Option<&Account>,
    placement: Placement<'_>,
) -> Result<(), ValidationError> {
    let self_id = current.map(|a| a.id);
    let others: Vec<&Account> = chart.iter().filter(|a| Some(a.id) != self_id).collect();

    if let Some(current) = current {
        let has_children = others.iter().any(|a| a.parent_id == Some(current.id));
        let reshaped =
            current.code != placement.code || current.kind != placement.kind || current.analytic != placement.analytic;
        if has_children && reshaped {
            return Err(ValidationError::single(
                "code",
                "Conta com subcontas não pode mudar código, tipo ou natureza",
            ));
        }
    }

    if let Some(parent_id) = placement.parent_id {
        if self_id == Some(parent_id) {
            return Err(ValidationError::single("parent_id", "A conta não pode ser superior a si mesma"));
        }
        let parent = others
            .iter()
            .find(|a| a.id == parent_id)
            .ok_or_else(|| ValidationError::single("parent_id", "Conta superior não encontrada"))?;
        if let Some(current) = current
            && is_descendant_code(&current.code, &parent.code)
        {
            return Err(ValidationError::single("parent_id", "A conta superior não pode ser uma subconta desta conta"));
        }
        check_parent(parent, placement.code, placement.kind)?;
    }

    if let Some(nearest) = nearest_synthetic_ancestor(&others, placement.code)
        && placement.parent_id != Some(nearest.id)
    {
        return Err(ValidationError::single(
            "parent_id",
            &format!("A conta superior deve ser {} ({})", nearest.code, nearest.name),
        ));
    }

    if !placement.analytic {
        let by_id = |id: Uuid| others.iter().find(|a| a.id == id);
        let stranded = others.iter().filter(|a| is_descendant_code(placement.code, &a.code)).find(|a| {
            match a.parent_id {
                Some(pid) if Some(pid) == self_id => false,
                // Linked outside this code.
                Some(pid) => by_id(pid).is_none_or(|p| !is_descendant_code(placement.code, &p.code)),
                None => true,
            }
        });
        if let Some(stranded) = stranded {
            return Err(ValidationError::single(
                "code",
                &format!("A conta {} já existe sob este código com outra conta superior", stranded.code),
            ));
        }
    }
    Ok(())
}

async fn check_placement(
    pool: &PgPool,
    tenant_id: Uuid,
    self_id: Option<Uuid>,
    placement: Placement<'_>,
) -> Result<(), ContabilError> {
    let chart = load_chart(pool, tenant_id).await?;
    let current = match self_id {
        Some(id) => Some(chart.iter().find(|a| a.id == id).ok_or(ContabilError::AccountNotFound(id))?),
        None => None,
    };
    check_hierarchy(&chart, current, placement)?;
    Ok(())
}

/// List accounts ordered by code.
///
/// # Errors
///
/// Invalid `kind` filter or database errors.
pub async fn list_accounts(
    pool: &PgPool,
    tenant_id: Uuid,
    params: &ListParams,
    filter: &AccountFilter,
) -> Result<Vec<Account>, ContabilError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = "));
    builder.push_bind(tenant_id);
    match filter.kind.as_deref() {
        None | Some("") => {}
        Some(raw) => {
            let kind = AccountKind::from_str(raw).ok_or_else(|| ValidationError::single("kind", "Tipo de conta inválido"))?;
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
    }
    if let Some(analytic) = filter.analytic {
        builder.push(" AND analytic = ").push_bind(analytic);
    }
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
    Ok(rows.iter().map(account_from_row).collect::<Result<Vec<_>, _>>()?)
}

/// Fetch one account.
///
/// # Errors
///
/// `AccountNotFound` or a database error.
pub async fn get_account(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Account, ContabilError> {
    find_account(pool, tenant_id, id).await?.ok_or(ContabilError::AccountNotFound(id))
}

/// Create an account.
///
/// # Errors
///
/// Validation failures (including parent rules), duplicate code, or database errors.
pub async fn create_account(pool: &PgPool, tenant_id: Uuid, input: &AccountInput) -> Result<Account, ContabilError> {
    let kind = validate_account(input)?;
    let code = input.code.trim();
    let analytic = input.analytic.unwrap_or(true);
    let placement = Placement { code, kind, analytic, parent_id: input.parent_id };
    check_placement(pool, tenant_id, None, placement).await?;

    let row = sqlx::query(&format!(
        "INSERT INTO accounts (tenant_id, code, name, kind, analytic, parent_id, active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(code)
    .bind(input.name.trim())
    .bind(kind.as_str())
    .bind(analytic)
    .bind(input.parent_id)
    .bind(input.active.unwrap_or(true))
    .fetch_one(pool)
    .await
    .map_err(|e| map_account_write_error(e, code))?;

    let account = account_from_row(&row)?;
    info!(%tenant_id, account_id = %account.id, code = %account.code, "account created");
    Ok(account)
}

/// Update an account. An account with entries cannot become synthetic, and
/// one with subaccounts keeps its code, kind and nature.
///
/// # Errors
///
/// Validation failures, duplicate code, `AccountNotFound`, or database errors.
pub async fn update_account(pool: &PgPool, tenant_id: Uuid, id: Uuid, input: &AccountInput) -> Result<Account, ContabilError> {
    let kind = validate_account(input)?;
    let code = input.code.trim();
    let analytic = input.analytic.unwrap_or(true);
    let placement = Placement { code, kind, analytic, parent_id: input.parent_id };
    check_placement(pool, tenant_id, Some(id), placement).await?;

    if !analytic && account_has_entries(pool, tenant_id, id).await? {
        return Err(ValidationError::single("analytic", "Conta com lançamentos não pode ser sintética").into());
    }

    let row = sqlx::query(&format!(
        "UPDATE accounts SET code = $3, name = $4, kind = $5, analytic = $6, parent_id = $7, active = $8
         WHERE tenant_id = $1 AND id = $2
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(code)
    .bind(input.name.trim())
    .bind(kind.as_str())
    .bind(analytic)
    .bind(input.parent_id)
    .bind(input.active.unwrap_or(true))
    .fetch_optional(pool)
    .await
    .map_err(|e| map_account_write_error(e, code))?
    .ok_or(ContabilError::AccountNotFound(id))?;
    Ok(account_from_row(&row)?)
}

/// Delete an account with no children and no entries.
///
/// # Errors
///
/// `AccountInUse`, `AccountNotFound`, or database errors.
pub async fn delete_account(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), ContabilError> {
    let has_children: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE tenant_id = $1 AND parent_id = $2)")
        .bind(tenant_id)
        .bind(id)
        .fetch_one(pool)
        .await?;
    if has_children || account_has_entries(pool, tenant_id, id).await? {
        return Err(ContabilError::AccountInUse(id));
    }

    let result = sqlx::query("DELETE FROM accounts WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| if db::is_foreign_key_violation(&e) { ContabilError::AccountInUse(id) } else { ContabilError::Database(e) })?;
    if result.rows_affected() == 0 {
        return Err(ContabilError::AccountNotFound(id));
    }
    info!(%tenant_id, account_id = %id, "account deleted");
    Ok(())
}

async fn account_has_entries(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM ledger_entries
                       WHERE tenant_id = $1 AND (debit_account_id = $2 OR credit_account_id = $2))",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_one(pool)
    .await
}

// =============================================================================
// LEDGER ENTRIES
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_date: Date,
    pub debit_account_id: Uuid,
    pub credit_account_id: Uuid,
    pub amount_cents: i64,
    pub amount_formatted: String,
    pub history: String,
    pub document: Option<String>,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerEntryInput {
    #[serde(deserialize_with = "de::date")]
    pub entry_date: Date,
    pub debit_account_id: Uuid,
    pub credit_account_id: Uuid,
    #[serde(deserialize_with = "de::cents")]
    pub amount_cents: i64,
    pub history: String,
    pub document: Option<String>,
    pub cost_center_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryFilter {
    /// Matches entries on either side.
    pub account_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
}

fn entry_from_row(r: &PgRow) -> LedgerEntry {
    let amount_cents: i64 = r.get("amount_cents");
    LedgerEntry {
        id: r.get("id"),
        entry_date: r.get("entry_date"),
        debit_account_id: r.get("debit_account_id"),
        credit_account_id: r.get("credit_account_id"),
        amount_cents,
        amount_formatted: format_brl(amount_cents),
        history: r.get("history"),
        document: r.get("document"),
        cost_center_id: r.get("cost_center_id"),
    }
}

/// Form checks that need no database access.
pub(crate) fn validate_entry(input: &LedgerEntryInput) -> Result<(), ContabilError> {
    let mut errors = FieldErrors::new();
    errors.distinct_accounts(input.debit_account_id, input.credit_account_id);
    errors.positive_amount("amount_cents", input.amount_cents);
    errors.required("history", &input.history);
    errors.max_len("history", &input.history, 500);
    if let Some(document) = &input.document {
        errors.max_len("document", document, 60);
    }
    errors.into_result().map_err(|err| {
        if err.fields.iter().any(|f| f.message == MSG_SAME_ACCOUNT) {
            ContabilError::SameAccount(err)
        } else {
            ContabilError::Validation(err)
        }
    })
}

async fn check_entry_references(pool: &PgPool, tenant_id: Uuid, input: &LedgerEntryInput) -> Result<(), ContabilError> {
    let usable: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM accounts WHERE tenant_id = $1 AND id = ANY($2) AND analytic AND active",
    )
    .bind(tenant_id)
    .bind(vec![input.debit_account_id, input.credit_account_id])
    .fetch_all(pool)
    .await?;
    let usable: HashSet<Uuid> = usable.into_iter().collect();

    let mut errors = FieldErrors::new();
    if !usable.contains(&input.debit_account_id) {
        errors.push("debit_account_id", "Conta de débito inválida, inativa ou sintética");
    }
    if !usable.contains(&input.credit_account_id) {
        errors.push("credit_account_id", "Conta de crédito inválida, inativa ou sintética");
    }
    if let Some(cost_center_id) = input.cost_center_id {
        if !cost_center_is_active(pool, tenant_id, cost_center_id).await? {
            errors.push("cost_center_id", "Centro de custo inválido ou inativo");
        }
    }
    errors.into_result()?;
    Ok(())
}

fn document_value(input: &LedgerEntryInput) -> Option<String> {
    input
        .document
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
}

/// List ledger entries by date.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_entries(
    pool: &PgPool,
    tenant_id: Uuid,
    params: &ListParams,
    filter: &EntryFilter,
) -> Result<Vec<LedgerEntry>, ContabilError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE tenant_id = "));
    builder.push_bind(tenant_id);
    if let Some(account_id) = filter.account_id {
        builder.push(" AND (debit_account_id = ").push_bind(account_id);
        builder.push(" OR credit_account_id = ").push_bind(account_id).push(")");
    }
    if let Some(cost_center_id) = filter.cost_center_id {
        builder.push(" AND cost_center_id = ").push_bind(cost_center_id);
    }
    if let Some(from) = params.from {
        builder.push(" AND entry_date >= ").push_bind(from);
    }
    if let Some(to) = params.to {
        builder.push(" AND entry_date <= ").push_bind(to);
    }
    if let Some(pattern) = params.search_pattern() {
        builder.push(" AND (history ILIKE ").push_bind(pattern.clone());
        builder.push(" OR document ILIKE ").push_bind(pattern).push(")");
    }
    builder.push(" ORDER BY entry_date ASC, created_at ASC LIMIT ").push_bind(params.limit);
    builder.push(" OFFSET ").push_bind(params.offset);

    let rows = builder.build().fetch_all(pool).await?;
    Ok(rows.iter().map(entry_from_row).collect())
}

/// Fetch one ledger entry.
///
/// # Errors
///
/// `EntryNotFound` or a database error.
pub async fn get_entry(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<LedgerEntry, ContabilError> {
    let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContabilError::EntryNotFound(id))?;
    Ok(entry_from_row(&row))
}

/// Record a ledger entry. Same-account entries are rejected before any
/// database access.
///
/// # Errors
///
/// `SameAccount`, validation failures, or database errors.
pub async fn create_entry(
    pool: &PgPool,
    tenant_id: Uuid,
    created_by: Uuid,
    input: &LedgerEntryInput,
) -> Result<LedgerEntry, ContabilError> {
    validate_entry(input)?;
    check_entry_references(pool, tenant_id, input).await?;

    let row = sqlx::query(&format!(
        "INSERT INTO ledger_entries
             (tenant_id, entry_date, debit_account_id, credit_account_id, amount_cents, history, document,
              cost_center_id, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(input.entry_date)
    .bind(input.debit_account_id)
    .bind(input.credit_account_id)
    .bind(input.amount_cents)
    .bind(input.history.trim())
    .bind(document_value(input))
    .bind(input.cost_center_id)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    let entry = entry_from_row(&row);
    info!(%tenant_id, entry_id = %entry.id, amount_cents = entry.amount_cents, "ledger entry created");
    Ok(entry)
}

/// Replace a ledger entry.
///
/// # Errors
///
/// `SameAccount`, validation failures, `EntryNotFound`, or database errors.
pub async fn update_entry(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    input: &LedgerEntryInput,
) -> Result<LedgerEntry, ContabilError> {
    validate_entry(input)?;
    check_entry_references(pool, tenant_id, input).await?;

    let row = sqlx::query(&format!(
        "UPDATE ledger_entries
         SET entry_date = $3, debit_account_id = $4, credit_account_id = $5, amount_cents = $6, history = $7,
             document = $8, cost_center_id = $9
         WHERE tenant_id = $1 AND id = $2
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(input.entry_date)
    .bind(input.debit_account_id)
    .bind(input.credit_account_id)
    .bind(input.amount_cents)
    .bind(input.history.trim())
    .bind(document_value(input))
    .bind(input.cost_center_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ContabilError::EntryNotFound(id))?;
    Ok(entry_from_row(&row))
}

/// Delete a ledger entry.
///
/// # Errors
///
/// `EntryNotFound` or a database error.
pub async fn delete_entry(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), ContabilError> {
    let result = sqlx::query("DELETE FROM ledger_entries WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ContabilError::EntryNotFound(id));
    }
    info!(%tenant_id, entry_id = %id, "ledger entry deleted");
    Ok(())
}

// =============================================================================
// TRIAL BALANCE (BALANCETE)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceteLine {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub analytic: bool,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub balance_cents: i64,
    pub balance_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Balancete {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub lines: Vec<BalanceteLine>,
    pub total_debit_cents: i64,
    pub total_credit_cents: i64,
}

/// Own debit/credit totals of one account in the period.
#[derive(Debug, Clone)]
pub struct AccountTotals {
    pub account: Account,
    pub debit_cents: i64,
    pub credit_cents: i64,
}

/// Roll synthetic accounts up from their descendants and sign balances by nature.
///
/// Lines come out ordered by code. Grand totals sum analytic accounts only.
#[must_use]
pub fn build_balancete(from: Option<Date>, to: Option<Date>, mut totals: Vec<AccountTotals>) -> Balancete {
    totals.sort_by(|a, b| a.account.code.cmp(&b.account.code));

    let mut lines = Vec::with_capacity(totals.len());
    let mut total_debit_cents = 0i64;
    let mut total_credit_cents = 0i64;
    for t in &totals {
        let (debit_cents, credit_cents) = if t.account.analytic {
            total_debit_cents = total_debit_cents.saturating_add(t.debit_cents);
            total_credit_cents = total_credit_cents.saturating_add(t.credit_cents);
            (t.debit_cents, t.credit_cents)
        } else {
            totals
                .iter()
                .filter(|d| d.account.analytic && is_descendant_code(&t.account.code, &d.account.code))
                .fold((0i64, 0i64), |(dr, cr), d| (dr.saturating_add(d.debit_cents), cr.saturating_add(d.credit_cents)))
        };
        let balance_cents = t.account.kind.balance(debit_cents, credit_cents);
        lines.push(BalanceteLine {
            account_id: t.account.id,
            code: t.account.code.clone(),
            name: t.account.name.clone(),
            kind: t.account.kind,
            analytic: t.account.analytic,
            debit_cents,
            credit_cents,
            balance_cents,
            balance_formatted: format_brl(balance_cents),
        });
    }

    Balancete { from, to, lines, total_debit_cents, total_credit_cents }
}

/// Trial balance for the period.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn balancete(pool: &PgPool, tenant_id: Uuid, from: Option<Date>, to: Option<Date>) -> Result<Balancete, ContabilError> {
    let rows = sqlx::query(
        r"SELECT a.id, a.code, a.name, a.kind, a.analytic, a.parent_id, a.active,
                 COALESCE(SUM(e.amount_cents) FILTER (WHERE e.debit_account_id = a.id), 0)::BIGINT AS debit_cents,
                 COALESCE(SUM(e.amount_cents) FILTER (WHERE e.credit_account_id = a.id), 0)::BIGINT AS credit_cents
          FROM accounts a
          LEFT JOIN ledger_entries e
                 ON (e.debit_account_id = a.id OR e.credit_account_id = a.id)
                AND ($2::date IS NULL OR e.entry_date >= $2)
                AND ($3::date IS NULL OR e.entry_date <= $3)
          WHERE a.tenant_id = $1
          GROUP BY a.id
          ORDER BY a.code",
    )
    .bind(tenant_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let mut totals = Vec::with_capacity(rows.len());
    for r in &rows {
        totals.push(AccountTotals {
            account: account_from_row(r)?,
            debit_cents: r.get("debit_cents"),
            credit_cents: r.get("credit_cents"),
        });
    }
    Ok(build_balancete(from, to, totals))
}

// =============================================================================
// ACCOUNT LEDGER (RAZÃO)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RazaoLine {
    pub entry_id: Uuid,
    pub entry_date: Date,
    pub history: String,
    pub document: Option<String>,
    /// The other side of the entry.
    pub counterpart_account_id: Uuid,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub balance_cents: i64,
    pub balance_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Razao {
    pub account: Account,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub opening_balance_cents: i64,
    pub closing_balance_cents: i64,
    pub opening_balance_formatted: String,
    pub closing_balance_formatted: String,
    pub lines: Vec<RazaoLine>,
}

/// Running balance over `entries` (already in date order) for one account.
#[must_use]
pub fn running_ledger(account_id: Uuid, kind: AccountKind, opening_cents: i64, entries: &[LedgerEntry]) -> Vec<RazaoLine> {
    let mut balance = opening_cents;
    entries
        .iter()
        .map(|e| {
            let (debit_cents, credit_cents, counterpart_account_id) = if e.debit_account_id == account_id {
                (e.amount_cents, 0, e.credit_account_id)
            } else {
                (0, e.amount_cents, e.debit_account_id)
            };
            balance = balance.saturating_add(kind.balance(debit_cents, credit_cents));
            RazaoLine {
                entry_id: e.id,
                entry_date: e.entry_date,
                history: e.history.clone(),
                document: e.document.clone(),
                counterpart_account_id,
                debit_cents,
                credit_cents,
                balance_cents: balance,
                balance_formatted: format_brl(balance),
            }
        })
        .collect()
}

/// Ledger of one account for the period, starting from its balance before `from`.
///
/// # Errors
///
/// `AccountNotFound` or a database error.
pub async fn razao(
    pool: &PgPool,
    tenant_id: Uuid,
    account_id: Uuid,
    from: Option<Date>,
    to: Option<Date>,
) -> Result<Razao, ContabilError> {
    let account = get_account(pool, tenant_id, account_id).await?;

    let opening_balance_cents = match from {
        Some(from) => {
            let row = sqlx::query(
                r"SELECT COALESCE(SUM(amount_cents) FILTER (WHERE debit_account_id = $2), 0)::BIGINT AS debit_cents,
                         COALESCE(SUM(amount_cents) FILTER (WHERE credit_account_id = $2), 0)::BIGINT AS credit_cents
                  FROM ledger_entries
                  WHERE tenant_id = $1 AND (debit_account_id = $2 OR credit_account_id = $2) AND entry_date < $3",
            )
            .bind(tenant_id)
            .bind(account_id)
            .bind(from)
            .fetch_one(pool)
            .await?;
            account.kind.balance(row.get("debit_cents"), row.get("credit_cents"))
        }
        None => 0,
    };

    let rows = sqlx::query(&format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries
         WHERE tenant_id = $1 AND (debit_account_id = $2 OR credit_account_id = $2)
           AND ($3::date IS NULL OR entry_date >= $3)
           AND ($4::date IS NULL OR entry_date <= $4)
         ORDER BY entry_date ASC, created_at ASC"
    ))
    .bind(tenant_id)
    .bind(account_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    let entries: Vec<LedgerEntry> = rows.iter().map(entry_from_row).collect();

    let lines = running_ledger(account_id, account.kind, opening_balance_cents, &entries);
    let closing_balance_cents = lines.last().map_or(opening_balance_cents, |l| l.balance_cents);
    Ok(Razao {
        account,
        from,
        to,
        opening_balance_cents,
        closing_balance_cents,
        opening_balance_formatted: format_brl(opening_balance_cents),
        closing_balance_formatted: format_brl(closing_balance_cents),
        lines,
    })
}

#[cfg(test)]
#[path = "contabil_test.rs"]
mod tests;
