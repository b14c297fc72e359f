//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every business route lives under `/api/<module>/...` and expects
//! `Authorization: Bearer <token>` plus `X-Tenant-Id: <uuid>`. Auth routes
//! under `/api/auth` only need the bearer (or nothing, for sign-in/sign-up).
//! Handlers translate HTTP into service calls; status mapping comes from
//! each service error's `ErrorCode` impl.

pub mod auth;
pub mod cadastros;
pub mod contabil;
pub mod extract;
pub mod financeiro;
pub mod okr;
pub mod tenant;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use serde::Deserialize;
use time::Date;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::listing::{ListParams, ListQuery};
use crate::state::AppState;
use crate::validate::FieldErrors;

/// Full API router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ---- auth ----
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/auth/provider/sign-in", post(auth::provider_sign_in))
        // ---- cadastros ----
        .route("/api/cadastros/empresas", get(tenant::list_tenants).post(tenant::create_tenant))
        .route(
            "/api/cadastros/empresas/{id}",
            get(tenant::get_tenant)
                .put(tenant::update_tenant)
                .delete(tenant::delete_tenant),
        )
        .route("/api/cadastros/usuarios", get(tenant::list_members).post(tenant::add_member))
        .route(
            "/api/cadastros/usuarios/{user_id}",
            put(tenant::update_member).delete(tenant::remove_member),
        )
        .route("/api/cadastros/permissoes", get(tenant::permissions))
        .route(
            "/api/cadastros/centros-custo",
            get(cadastros::list_cost_centers).post(cadastros::create_cost_center),
        )
        .route(
            "/api/cadastros/centros-custo/{id}",
            get(cadastros::get_cost_center)
                .put(cadastros::update_cost_center)
                .delete(cadastros::delete_cost_center),
        )
        // ---- financeiro ----
        .route(
            "/api/financeiro/contas-bancarias",
            get(financeiro::list_bank_accounts).post(financeiro::create_bank_account),
        )
        .route(
            "/api/financeiro/contas-bancarias/{id}",
            get(financeiro::get_bank_account)
                .put(financeiro::update_bank_account)
                .delete(financeiro::delete_bank_account),
        )
        .route("/api/financeiro/contas-bancarias/{id}/saldo", get(financeiro::bank_account_balance))
        .route(
            "/api/financeiro/movimentacoes",
            get(financeiro::list_movements).post(financeiro::create_movement),
        )
        .route(
            "/api/financeiro/movimentacoes/{id}",
            get(financeiro::get_movement)
                .put(financeiro::update_movement)
                .delete(financeiro::delete_movement),
        )
        .route("/api/financeiro/movimentacoes/{id}/baixa", post(financeiro::settle_movement))
        .route("/api/financeiro/movimentacoes/{id}/cancelar", post(financeiro::cancel_movement))
        .route("/api/financeiro/resumo", get(financeiro::summary))
        // ---- contabil ----
        .route("/api/contabil/contas", get(contabil::list_accounts).post(contabil::create_account))
        .route(
            "/api/contabil/contas/{id}",
            get(contabil::get_account)
                .put(contabil::update_account)
                .delete(contabil::delete_account),
        )
        .route("/api/contabil/contas/{id}/razao", get(contabil::razao))
        .route("/api/contabil/lancamentos", get(contabil::list_entries).post(contabil::create_entry))
        .route(
            "/api/contabil/lancamentos/{id}",
            get(contabil::get_entry)
                .put(contabil::update_entry)
                .delete(contabil::delete_entry),
        )
        .route("/api/contabil/balancete", get(contabil::balancete))
        // ---- okr ----
        .route("/api/okr/objetivos", get(okr::list_objectives).post(okr::create_objective))
        .route(
            "/api/okr/objetivos/{id}",
            get(okr::get_objective)
                .put(okr::update_objective)
                .delete(okr::delete_objective),
        )
        .route(
            "/api/okr/objetivos/{id}/resultados-chave",
            get(okr::list_key_results).post(okr::create_key_result),
        )
        .route(
            "/api/okr/resultados-chave/{id}",
            get(okr::get_key_result)
                .put(okr::update_key_result)
                .patch(okr::check_in)
                .delete(okr::delete_key_result),
        )
        .route(
            "/api/okr/resultados-chave/{id}/tarefas",
            get(okr::list_tasks).post(okr::create_task),
        )
        .route(
            "/api/okr/tarefas/{id}",
            put(okr::update_task).patch(okr::set_task_done).delete(okr::delete_task),
        )
        .route("/healthz", get(healthz))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// SHARED QUERY HELPERS
// =============================================================================

/// `?from=&to=` for period reports.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl PeriodQuery {
    /// # Errors
    ///
    /// 422 when `from` is after `to`.
    pub fn validated(self) -> Result<(Option<Date>, Option<Date>), ApiError> {
        let mut errors = FieldErrors::new();
        if let (Some(from), Some(to)) = (self.from, self.to) {
            errors.date_range("from", from, to);
        }
        errors.into_result()?;
        Ok((self.from, self.to))
    }
}

/// Normalize list parameters against the configured page size.
pub(crate) fn list_params(state: &AppState, query: ListQuery) -> Result<ListParams, ApiError> {
    Ok(query.into_params(state.config.page_size_max)?)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
