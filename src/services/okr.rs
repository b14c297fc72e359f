//! OKR module: objectives, key results, and their task trees.
//!
//! DESIGN
//! ======
//! Progress is derived, never stored. A key result's progress is where its
//! current value sits between start and target, clamped to 0..=100, so
//! "reduce churn from 8 to 2" works the same as "grow MRR from 0 to 50k".
//! An objective's progress is the plain mean of its key results.
//!
//! Tasks hang off a key result and nest exactly one level: a subtask's parent
//! must be a top-level task of the same key result.

use std::collections::HashMap;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use time::Date;
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::format::{de, format_percent};
use crate::listing::ListParams;
use crate::services::tenant::is_member;
use crate::validate::{FieldError, FieldErrors, ValidationError};

const OBJECTIVE_COLUMNS: &str = "id, title, description, period_start, period_end, owner_id";
const KEY_RESULT_COLUMNS: &str = "id, objective_id, title, start_value, target_value, current_value, unit";
const TASK_COLUMNS: &str = "id, key_result_id, parent_task_id, title, done, due_date, assignee_id";

#[derive(Debug, thiserror::Error)]
pub enum OkrError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Objetivo não encontrado")]
    ObjectiveNotFound(Uuid),
    #[error("Resultado-chave não encontrado")]
    KeyResultNotFound(Uuid),
    #[error("Tarefa não encontrada")]
    TaskNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for OkrError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::ObjectiveNotFound(_) => "E_OBJECTIVE_NOT_FOUND",
            Self::KeyResultNotFound(_) => "E_KEY_RESULT_NOT_FOUND",
            Self::TaskNotFound(_) => "E_TASK_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ObjectiveNotFound(_) | Self::KeyResultNotFound(_) | Self::TaskNotFound(_) => StatusCode::NOT_FOUND,
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
// PROGRESS
// =============================================================================

/// Percent of the way from `start` to `target`, clamped to 0..=100.
#[must_use]
pub fn key_result_progress(start: f64, target: f64, current: f64) -> f64 {
    let span = target - start;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    (((current - start) / span) * 100.0).clamp(0.0, 100.0)
}

/// Mean of key-result progress values; 0 when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn objective_progress(progress: &[f64]) -> f64 {
    if progress.is_empty() {
        return 0.0;
    }
    progress.iter().sum::<f64>() / progress.len() as f64
}

// =============================================================================
// OBJECTIVES
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Objective {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub period_start: Date,
    pub period_end: Date,
    pub owner_id: Option<Uuid>,
    pub progress: f64,
    pub progress_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveDetail {
    #[serde(flatten)]
    pub objective: Objective,
    pub key_results: Vec<KeyResult>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectiveInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "de::date")]
    pub period_start: Date,
    #[serde(deserialize_with = "de::date")]
    pub period_end: Date,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObjectiveFilter {
    pub owner_id: Option<Uuid>,
}

fn objective_from_row(r: &PgRow, progress: f64) -> Objective {
    Objective {
        id: r.get("id"),
        title: r.get("title"),
        description: r.get("description"),
        period_start: r.get("period_start"),
        period_end: r.get("period_end"),
        owner_id: r.get("owner_id"),
        progress,
        progress_formatted: format_percent(progress),
    }
}

pub(crate) fn validate_objective(input: &ObjectiveInput) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    errors.required("title", &input.title);
    errors.max_len("title", &input.title, 200);
    errors.date_range("period_end", input.period_start, input.period_end);
    errors.into_result()
}

async fn check_member_reference(pool: &PgPool, tenant_id: Uuid, field: &str, user_id: Option<Uuid>) -> Result<(), OkrError> {
    if let Some(user_id) = user_id {
        if !is_member(pool, tenant_id, user_id).await? {
            return Err(ValidationError::single(field, "Usuário não pertence à empresa").into());
        }
    }
    Ok(())
}

fn description_value(input: &ObjectiveInput) -> Option<String> {
    input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
}

/// List objectives overlapping `from`..`to`, each with its progress.
///
/// # Errors
///
/// Returns a database error if a query fails.
pub async fn list_objectives(
    pool: &PgPool,
    tenant_id: Uuid,
    params: &ListParams,
    filter: &ObjectiveFilter,
) -> Result<Vec<Objective>, OkrError> {
    let mut builder = QueryBuilder::new(format!("SELECT {OBJECTIVE_COLUMNS} FROM objectives WHERE tenant_id = "));
    builder.push_bind(tenant_id);
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND owner_id = ").push_bind(owner_id);
    }
    if let Some(from) = params.from {
        builder.push(" AND period_end >= ").push_bind(from);
    }
    if let Some(to) = params.to {
        builder.push(" AND period_start <= ").push_bind(to);
    }
    if let Some(pattern) = params.search_pattern() {
        builder.push(" AND title ILIKE ").push_bind(pattern);
    }
    builder.push(" ORDER BY period_start DESC, title ASC LIMIT ").push_bind(params.limit);
    builder.push(" OFFSET ").push_bind(params.offset);
    let rows = builder.build().fetch_all(pool).await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
    let krs = sqlx::query(&format!(
        "SELECT {KEY_RESULT_COLUMNS} FROM key_results WHERE tenant_id = $1 AND objective_id = ANY($2)"
    ))
    .bind(tenant_id)
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut by_objective: HashMap<Uuid, Vec<f64>> = HashMap::new();
    for kr in krs.iter().map(key_result_from_row) {
        by_objective.entry(kr.objective_id).or_default().push(kr.progress);
    }

    Ok(rows
        .iter()
        .map(|r| {
            let id: Uuid = r.get("id");
            let progress = by_objective.get(&id).map_or(0.0, |p| objective_progress(p));
            objective_from_row(r, progress)
        })
        .collect())
}

/// Fetch an objective with its key results.
///
/// # Errors
///
/// `ObjectiveNotFound` or a database error.
pub async fn get_objective(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<ObjectiveDetail, OkrError> {
    let row = sqlx::query(&format!("SELECT {OBJECTIVE_COLUMNS} FROM objectives WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(OkrError::ObjectiveNotFound(id))?;
    let key_results = fetch_key_results(pool, tenant_id, id).await?;
    let progress: Vec<f64> = key_results.iter().map(|kr| kr.progress).collect();
    Ok(ObjectiveDetail { objective: objective_from_row(&row, objective_progress(&progress)), key_results })
}

/// Create an objective.
///
/// # Errors
///
/// Validation failures (including an owner outside the tenant) or database errors.
pub async fn create_objective(pool: &PgPool, tenant_id: Uuid, input: &ObjectiveInput) -> Result<Objective, OkrError> {
    validate_objective(input)?;
    check_member_reference(pool, tenant_id, "owner_id", input.owner_id).await?;

    let row = sqlx::query(&format!(
        "INSERT INTO objectives (tenant_id, title, description, period_start, period_end, owner_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {OBJECTIVE_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(input.title.trim())
    .bind(description_value(input))
    .bind(input.period_start)
    .bind(input.period_end)
    .bind(input.owner_id)
    .fetch_one(pool)
    .await?;

    let objective = objective_from_row(&row, 0.0);
    info!(%tenant_id, objective_id = %objective.id, "objective created");
    Ok(objective)
}

/// Update an objective.
///
/// # Errors
///
/// Validation failures, `ObjectiveNotFound`, or database errors.
pub async fn update_objective(pool: &PgPool, tenant_id: Uuid, id: Uuid, input: &ObjectiveInput) -> Result<ObjectiveDetail, OkrError> {
    validate_objective(input)?;
    check_member_reference(pool, tenant_id, "owner_id", input.owner_id).await?;

    let result = sqlx::query(
        "UPDATE objectives SET title = $3, description = $4, period_start = $5, period_end = $6, owner_id = $7
         WHERE tenant_id = $1 AND id = $2",
    )
    .bind(tenant_id)
    .bind(id)
    .bind(input.title.trim())
    .bind(description_value(input))
    .bind(input.period_start)
    .bind(input.period_end)
    .bind(input.owner_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(OkrError::ObjectiveNotFound(id));
    }
    get_objective(pool, tenant_id, id).await
}

/// Delete an objective with its key results and tasks.
///
/// # Errors
///
/// `ObjectiveNotFound` or a database error.
pub async fn delete_objective(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), OkrError> {
    let result = sqlx::query("DELETE FROM objectives WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OkrError::ObjectiveNotFound(id));
    }
    info!(%tenant_id, objective_id = %id, "objective deleted");
    Ok(())
}

// =============================================================================
// KEY RESULTS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct KeyResult {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub title: String,
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub progress: f64,
    pub progress_formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyResultInput {
    pub title: String,
    pub start_value: Option<f64>,
    pub target_value: f64,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
}

/// Check-in body: only the current value changes.
#[derive(Debug, Deserialize)]
pub struct CheckInInput {
    pub current_value: f64,
}

fn key_result_from_row(r: &PgRow) -> KeyResult {
    let start_value: f64 = r.get("start_value");
    let target_value: f64 = r.get("target_value");
    let current_value: f64 = r.get("current_value");
    let progress = key_result_progress(start_value, target_value, current_value);
    KeyResult {
        id: r.get("id"),
        objective_id: r.get("objective_id"),
        title: r.get("title"),
        start_value,
        target_value,
        current_value,
        unit: r.get("unit"),
        progress,
        progress_formatted: format_percent(progress),
    }
}

#[allow(clippy::float_cmp)]
pub(crate) fn validate_key_result(input: &KeyResultInput) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    errors.required("title", &input.title);
    errors.max_len("title", &input.title, 200);
    let start = input.start_value.unwrap_or(0.0);
    let values = [
        ("start_value", start),
        ("target_value", input.target_value),
        ("current_value", input.current_value.unwrap_or(start)),
    ];
    for (field, value) in values {
        if !value.is_finite() {
            errors.push(field, "Valor numérico inválido");
        }
    }
    if input.target_value == start {
        errors.push("target_value", "A meta deve ser diferente do valor inicial");
    }
    errors.into_result()
}

async fn fetch_key_results(pool: &PgPool, tenant_id: Uuid, objective_id: Uuid) -> Result<Vec<KeyResult>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {KEY_RESULT_COLUMNS} FROM key_results
         WHERE tenant_id = $1 AND objective_id = $2
         ORDER BY created_at ASC"
    ))
    .bind(tenant_id)
    .bind(objective_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(key_result_from_row).collect())
}

/// Key results of an objective.
///
/// # Errors
///
/// `ObjectiveNotFound` or a database error.
pub async fn list_key_results(pool: &PgPool, tenant_id: Uuid, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
    ensure_objective(pool, tenant_id, objective_id).await?;
    Ok(fetch_key_results(pool, tenant_id, objective_id).await?)
}

async fn ensure_objective(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), OkrError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM objectives WHERE tenant_id = $1 AND id = $2)")
        .bind(tenant_id)
        .bind(id)
        .fetch_one(pool)
        .await?;
    if exists { Ok(()) } else { Err(OkrError::ObjectiveNotFound(id)) }
}

/// Fetch one key result.
///
/// # Errors
///
/// `KeyResultNotFound` or a database error.
pub async fn get_key_result(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<KeyResult, OkrError> {
    let row = sqlx::query(&format!("SELECT {KEY_RESULT_COLUMNS} FROM key_results WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(OkrError::KeyResultNotFound(id))?;
    Ok(key_result_from_row(&row))
}

fn unit_value(input: &KeyResultInput) -> Option<String> {
    input.unit.as_deref().map(str::trim).filter(|u| !u.is_empty()).map(str::to_owned)
}

/// Add a key result to an objective.
///
/// # Errors
///
/// Validation failures, `ObjectiveNotFound`, or database errors.
pub async fn create_key_result(
    pool: &PgPool,
    tenant_id: Uuid,
    objective_id: Uuid,
    input: &KeyResultInput,
) -> Result<KeyResult, OkrError> {
    validate_key_result(input)?;
    ensure_objective(pool, tenant_id, objective_id).await?;

    let start = input.start_value.unwrap_or(0.0);
    let row = sqlx::query(&format!(
        "INSERT INTO key_results (tenant_id, objective_id, title, start_value, target_value, current_value, unit)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {KEY_RESULT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(objective_id)
    .bind(input.title.trim())
    .bind(start)
    .bind(input.target_value)
    .bind(input.current_value.unwrap_or(start))
    .bind(unit_value(input))
    .fetch_one(pool)
    .await?;

    let kr = key_result_from_row(&row);
    info!(%tenant_id, %objective_id, key_result_id = %kr.id, "key result created");
    Ok(kr)
}

/// Replace a key result's fields.
///
/// # Errors
///
/// Validation failures, `KeyResultNotFound`, or database errors.
pub async fn update_key_result(pool: &PgPool, tenant_id: Uuid, id: Uuid, input: &KeyResultInput) -> Result<KeyResult, OkrError> {
    validate_key_result(input)?;
    let start = input.start_value.unwrap_or(0.0);
    let row = sqlx::query(&format!(
        "UPDATE key_results SET title = $3, start_value = $4, target_value = $5, current_value = $6, unit = $7
         WHERE tenant_id = $1 AND id = $2
         RETURNING {KEY_RESULT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(input.title.trim())
    .bind(start)
    .bind(input.target_value)
    .bind(input.current_value.unwrap_or(start))
    .bind(unit_value(input))
    .fetch_optional(pool)
    .await?
    .ok_or(OkrError::KeyResultNotFound(id))?;
    Ok(key_result_from_row(&row))
}

/// Record a new current value.
///
/// # Errors
///
/// Non-finite value, `KeyResultNotFound`, or database errors.
pub async fn check_in(pool: &PgPool, tenant_id: Uuid, id: Uuid, current_value: f64) -> Result<KeyResult, OkrError> {
    if !current_value.is_finite() {
        return Err(ValidationError::single("current_value", "Valor numérico inválido").into());
    }
    let row = sqlx::query(&format!(
        "UPDATE key_results SET current_value = $3 WHERE tenant_id = $1 AND id = $2 RETURNING {KEY_RESULT_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(current_value)
    .fetch_optional(pool)
    .await?
    .ok_or(OkrError::KeyResultNotFound(id))?;

    let kr = key_result_from_row(&row);
    info!(%tenant_id, key_result_id = %id, progress = kr.progress, "key result check-in");
    Ok(kr)
}

/// Delete a key result and its tasks.
///
/// # Errors
///
/// `KeyResultNotFound` or a database error.
pub async fn delete_key_result(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), OkrError> {
    let result = sqlx::query("DELETE FROM key_results WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OkrError::KeyResultNotFound(id));
    }
    info!(%tenant_id, key_result_id = %id, "key result deleted");
    Ok(())
}

// =============================================================================
// TASKS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub key_result_id: Uuid,
    pub parent_task_id: Option<Uuid>,
    pub title: String,
    pub done: bool,
    pub due_date: Option<Date>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskTree {
    pub key_result_id: Uuid,
    pub tasks: Vec<TaskNode>,
    pub total: usize,
    pub done: usize,
    /// Done tasks over all tasks, subtasks included, in percent.
    pub completion: f64,
    pub completion_formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskInput {
    pub title: String,
    pub parent_task_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::option_date")]
    pub due_date: Option<Date>,
    pub assignee_id: Option<Uuid>,
    pub done: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TaskDoneInput {
    pub done: bool,
}

fn task_from_row(r: &PgRow) -> Task {
    Task {
        id: r.get("id"),
        key_result_id: r.get("key_result_id"),
        parent_task_id: r.get("parent_task_id"),
        title: r.get("title"),
        done: r.get("done"),
        due_date: r.get("due_date"),
        assignee_id: r.get("assignee_id"),
    }
}

/// Group tasks (in display order) under their top-level parents.
///
/// Subtasks whose parent is missing from `tasks` are dropped.
#[must_use]
pub fn build_task_tree(key_result_id: Uuid, tasks: Vec<Task>) -> TaskTree {
    let total = tasks.len();
    let done = tasks.iter().filter(|t| t.done).count();

    let (roots, children): (Vec<Task>, Vec<Task>) = tasks.into_iter().partition(|t| t.parent_task_id.is_none());
    let mut subtasks: HashMap<Uuid, Vec<Task>> = HashMap::new();
    for child in children {
        if let Some(parent) = child.parent_task_id {
            subtasks.entry(parent).or_default().push(child);
        }
    }
    let nodes = roots
        .into_iter()
        .map(|task| {
            let subtasks = subtasks.remove(&task.id).unwrap_or_default();
            TaskNode { task, subtasks }
        })
        .collect();

    let completion = completion_ratio(done, total);
    TaskTree { key_result_id, tasks: nodes, total, done, completion, completion_formatted: format_percent(completion) }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_ratio(done: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { done as f64 / total as f64 * 100.0 }
}

pub(crate) fn validate_task(input: &TaskInput) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    errors.required("title", &input.title);
    errors.max_len("title", &input.title, 200);
    errors.into_result()
}

/// A parent must belong to the same key result and be top-level itself.
pub(crate) fn check_task_parent(parent: &Task, key_result_id: Uuid) -> Result<(), ValidationError> {
    if parent.key_result_id != key_result_id {
        return Err(ValidationError::single("parent_task_id", "A tarefa superior pertence a outro resultado-chave"));
    }
    if parent.parent_task_id.is_some() {
        return Err(ValidationError::single("parent_task_id", "Subtarefas não podem ter subtarefas"));
    }
    Ok(())
}

async fn find_task(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM okr_tasks WHERE tenant_id = $1 AND id = $2"))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(task_from_row))
}

async fn check_parent_reference(
    pool: &PgPool,
    tenant_id: Uuid,
    key_result_id: Uuid,
    parent_task_id: Option<Uuid>,
) -> Result<(), OkrError> {
    let Some(parent_id) = parent_task_id else {
        return Ok(());
    };
    let parent = find_task(pool, tenant_id, parent_id)
        .await?
        .ok_or_else(|| ValidationError::single("parent_task_id", "Tarefa superior não encontrada"))?;
    check_task_parent(&parent, key_result_id)?;
    Ok(())
}

/// Tasks of a key result as a one-level tree.
///
/// # Errors
///
/// `KeyResultNotFound` or a database error.
pub async fn list_tasks(pool: &PgPool, tenant_id: Uuid, key_result_id: Uuid) -> Result<TaskTree, OkrError> {
    get_key_result(pool, tenant_id, key_result_id).await?;
    let rows = sqlx::query(&format!(
        "SELECT {TASK_COLUMNS} FROM okr_tasks
         WHERE tenant_id = $1 AND key_result_id = $2
         ORDER BY created_at ASC"
    ))
    .bind(tenant_id)
    .bind(key_result_id)
    .fetch_all(pool)
    .await?;
    Ok(build_task_tree(key_result_id, rows.iter().map(task_from_row).collect()))
}

/// Create a task or subtask under a key result.
///
/// # Errors
///
/// Validation failures, `KeyResultNotFound`, or database errors.
pub async fn create_task(pool: &PgPool, tenant_id: Uuid, key_result_id: Uuid, input: &TaskInput) -> Result<Task, OkrError> {
    validate_task(input)?;
    get_key_result(pool, tenant_id, key_result_id).await?;
    check_parent_reference(pool, tenant_id, key_result_id, input.parent_task_id).await?;
    check_member_reference(pool, tenant_id, "assignee_id", input.assignee_id).await?;

    let row = sqlx::query(&format!(
        "INSERT INTO okr_tasks (tenant_id, key_result_id, parent_task_id, title, done, due_date, assignee_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(key_result_id)
    .bind(input.parent_task_id)
    .bind(input.title.trim())
    .bind(input.done.unwrap_or(false))
    .bind(input.due_date)
    .bind(input.assignee_id)
    .fetch_one(pool)
    .await?;

    let task = task_from_row(&row);
    info!(%tenant_id, %key_result_id, task_id = %task.id, "task created");
    Ok(task)
}

/// Update a task. A task that has subtasks cannot itself become a subtask.
///
/// # Errors
///
/// Validation failures, `TaskNotFound`, or database errors.
pub async fn update_task(pool: &PgPool, tenant_id: Uuid, id: Uuid, input: &TaskInput) -> Result<Task, OkrError> {
    validate_task(input)?;
    let current = find_task(pool, tenant_id, id).await?.ok_or(OkrError::TaskNotFound(id))?;

    if let Some(parent_id) = input.parent_task_id {
        if parent_id == id {
            return Err(ValidationError::single("parent_task_id", "A tarefa não pode ser superior a si mesma").into());
        }
        let has_children: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM okr_tasks WHERE tenant_id = $1 AND parent_task_id = $2)")
                .bind(tenant_id)
                .bind(id)
                .fetch_one(pool)
                .await?;
        if has_children {
            return Err(ValidationError::single("parent_task_id", "Tarefas com subtarefas não podem virar subtarefas").into());
        }
    }
    check_parent_reference(pool, tenant_id, current.key_result_id, input.parent_task_id).await?;
    check_member_reference(pool, tenant_id, "assignee_id", input.assignee_id).await?;

    let row = sqlx::query(&format!(
        "UPDATE okr_tasks SET parent_task_id = $3, title = $4, done = $5, due_date = $6, assignee_id = $7
         WHERE tenant_id = $1 AND id = $2
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(input.parent_task_id)
    .bind(input.title.trim())
    .bind(input.done.unwrap_or(current.done))
    .bind(input.due_date)
    .bind(input.assignee_id)
    .fetch_optional(pool)
    .await?
    .ok_or(OkrError::TaskNotFound(id))?;
    Ok(task_from_row(&row))
}

/// Mark a task done or not done.
///
/// # Errors
///
/// `TaskNotFound` or a database error.
pub async fn set_task_done(pool: &PgPool, tenant_id: Uuid, id: Uuid, done: bool) -> Result<Task, OkrError> {
    let row = sqlx::query(&format!(
        "UPDATE okr_tasks SET done = $3 WHERE tenant_id = $1 AND id = $2 RETURNING {TASK_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(done)
    .fetch_optional(pool)
    .await?
    .ok_or(OkrError::TaskNotFound(id))?;
    Ok(task_from_row(&row))
}

/// Delete a task and its subtasks.
///
/// # Errors
///
/// `TaskNotFound` or a database error.
pub async fn delete_task(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), OkrError> {
    let result = sqlx::query("DELETE FROM okr_tasks WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OkrError::TaskNotFound(id));
    }
    info!(%tenant_id, task_id = %id, "task deleted");
    Ok(())
}

#[cfg(test)]
#[path = "okr_test.rs"]
mod tests;
