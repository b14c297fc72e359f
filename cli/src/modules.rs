//! One thin service object per server module. Each method maps to exactly
//! one route; bodies are built with `json!` from the command arguments.

use reqwest::Method;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::{ApiClient, ClientError, Query, push_opt};

/// Optional `from`/`to` date pair shared by reports and list filters.
#[derive(Debug, Default, Clone)]
pub struct Period {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Period {
    fn into_query(self) -> Query {
        let mut query = Query::new();
        push_opt(&mut query, "from", self.from);
        push_opt(&mut query, "to", self.to);
        query
    }
}

// =============================================================================
// AUTH
// =============================================================================

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let builder = self.client.request(Method::POST, "/api/auth/sign-in")?;
        self.client.send(builder, Some(json!({ "email": email, "password": password }))).await
    }

    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<Value, ClientError> {
        let body = json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password_confirmation,
        });
        let builder = self.client.request(Method::POST, "/api/auth/sign-up")?;
        self.client.send(builder, Some(body)).await
    }

    pub async fn sign_out(&self) -> Result<Value, ClientError> {
        let builder = self.client.request(Method::POST, "/api/auth/sign-out")?;
        self.client.send(builder, None).await
    }

    pub async fn me(&self) -> Result<Value, ClientError> {
        let builder = self.client.request(Method::GET, "/api/auth/me")?;
        self.client.send(builder, None).await
    }
}

// =============================================================================
// CADASTROS
// =============================================================================

pub struct CadastrosApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CadastrosApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Companies are listed per user, so no tenant header is required.
    pub async fn list_companies(&self) -> Result<Value, ClientError> {
        let builder = self.client.request(Method::GET, "/api/cadastros/empresas")?;
        self.client.send(builder, None).await
    }

    pub async fn create_company(
        &self,
        name: &str,
        legal_name: Option<String>,
        cnpj: Option<String>,
    ) -> Result<Value, ClientError> {
        let body = json!({ "name": name, "legal_name": legal_name, "cnpj": cnpj });
        let builder = self.client.request(Method::POST, "/api/cadastros/empresas")?;
        self.client.send(builder, Some(body)).await
    }

    pub async fn permissions(&self) -> Result<Value, ClientError> {
        self.client.get("/api/cadastros/permissoes", &Query::new()).await
    }

    pub async fn list_cost_centers(&self, q: Option<String>, active: Option<bool>) -> Result<Value, ClientError> {
        let mut query = Query::new();
        push_opt(&mut query, "q", q);
        push_opt(&mut query, "active", active);
        self.client.get("/api/cadastros/centros-custo", &query).await
    }

    pub async fn create_cost_center(&self, code: &str, name: &str) -> Result<Value, ClientError> {
        let body = json!({ "code": code, "name": name, "active": true });
        self.client.post("/api/cadastros/centros-custo", Some(body)).await
    }
}

// =============================================================================
// FINANCEIRO
// =============================================================================

pub struct FinanceiroApi<'a> {
    client: &'a ApiClient,
}

#[derive(Debug, Default, Clone)]
pub struct MovementQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub bank_account_id: Option<Uuid>,
    pub q: Option<String>,
    pub period: Period,
}

#[derive(Debug, Clone)]
pub struct NewMovement {
    pub kind: String,
    pub description: String,
    pub category: Option<String>,
    pub amount_cents: i64,
    pub due_date: String,
    pub bank_account_id: Uuid,
    pub cost_center_id: Option<Uuid>,
}

impl<'a> FinanceiroApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_bank_accounts(&self) -> Result<Value, ClientError> {
        self.client.get("/api/financeiro/contas-bancarias", &Query::new()).await
    }

    pub async fn create_bank_account(
        &self,
        name: &str,
        bank_name: Option<String>,
        initial_balance_cents: i64,
    ) -> Result<Value, ClientError> {
        let body = json!({
            "name": name,
            "bank_name": bank_name,
            "initial_balance_cents": initial_balance_cents,
            "active": true,
        });
        self.client.post("/api/financeiro/contas-bancarias", Some(body)).await
    }

    pub async fn balance(&self, id: Uuid, until: Option<String>) -> Result<Value, ClientError> {
        let mut query = Query::new();
        push_opt(&mut query, "until", until);
        self.client.get(&format!("/api/financeiro/contas-bancarias/{id}/saldo"), &query).await
    }

    pub async fn list_movements(&self, filter: MovementQuery) -> Result<Value, ClientError> {
        let mut query = filter.period.into_query();
        push_opt(&mut query, "kind", filter.kind);
        push_opt(&mut query, "status", filter.status);
        push_opt(&mut query, "bank_account_id", filter.bank_account_id);
        push_opt(&mut query, "q", filter.q);
        self.client.get("/api/financeiro/movimentacoes", &query).await
    }

    pub async fn create_movement(&self, movement: NewMovement) -> Result<Value, ClientError> {
        let body = json!({
            "kind": movement.kind,
            "description": movement.description,
            "category": movement.category,
            "amount_cents": movement.amount_cents,
            "due_date": movement.due_date,
            "bank_account_id": movement.bank_account_id,
            "cost_center_id": movement.cost_center_id,
        });
        self.client.post("/api/financeiro/movimentacoes", Some(body)).await
    }

    pub async fn settle(&self, id: Uuid, paid_date: Option<String>) -> Result<Value, ClientError> {
        let body = json!({ "paid_date": paid_date });
        self.client.post(&format!("/api/financeiro/movimentacoes/{id}/baixa"), Some(body)).await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Value, ClientError> {
        self.client.post(&format!("/api/financeiro/movimentacoes/{id}/cancelar"), None).await
    }

    pub async fn summary(&self, period: Period) -> Result<Value, ClientError> {
        self.client.get("/api/financeiro/resumo", &period.into_query()).await
    }
}

// =============================================================================
// CONTABIL
// =============================================================================

pub struct ContabilApi<'a> {
    client: &'a ApiClient,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub kind: String,
    pub analytic: bool,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub entry_date: String,
    pub debit_account_id: Uuid,
    pub credit_account_id: Uuid,
    pub amount_cents: i64,
    pub history: String,
    pub document: Option<String>,
    pub cost_center_id: Option<Uuid>,
}

impl<'a> ContabilApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_accounts(&self, kind: Option<String>) -> Result<Value, ClientError> {
        let mut query = Query::new();
        push_opt(&mut query, "kind", kind);
        self.client.get("/api/contabil/contas", &query).await
    }

    pub async fn create_account(&self, account: NewAccount) -> Result<Value, ClientError> {
        let body = json!({
            "code": account.code,
            "name": account.name,
            "kind": account.kind,
            "analytic": account.analytic,
            "parent_id": account.parent_id,
            "active": true,
        });
        self.client.post("/api/contabil/contas", Some(body)).await
    }

    pub async fn razao(&self, id: Uuid, period: Period) -> Result<Value, ClientError> {
        self.client.get(&format!("/api/contabil/contas/{id}/razao"), &period.into_query()).await
    }

    pub async fn list_entries(&self, account_id: Option<Uuid>, period: Period) -> Result<Value, ClientError> {
        let mut query = period.into_query();
        push_opt(&mut query, "account_id", account_id);
        self.client.get("/api/contabil/lancamentos", &query).await
    }

    pub async fn create_entry(&self, entry: NewEntry) -> Result<Value, ClientError> {
        let body = json!({
            "entry_date": entry.entry_date,
            "debit_account_id": entry.debit_account_id,
            "credit_account_id": entry.credit_account_id,
            "amount_cents": entry.amount_cents,
            "history": entry.history,
            "document": entry.document,
            "cost_center_id": entry.cost_center_id,
        });
        self.client.post("/api/contabil/lancamentos", Some(body)).await
    }

    pub async fn delete_entry(&self, id: Uuid) -> Result<Value, ClientError> {
        self.client.delete(&format!("/api/contabil/lancamentos/{id}")).await
    }

    pub async fn balancete(&self, period: Period) -> Result<Value, ClientError> {
        self.client.get("/api/contabil/balancete", &period.into_query()).await
    }
}

// =============================================================================
// OKR
// =============================================================================

pub struct OkrApi<'a> {
    client: &'a ApiClient,
}

#[derive(Debug, Clone)]
pub struct NewKeyResult {
    pub title: String,
    pub start_value: f64,
    pub target_value: f64,
    pub unit: Option<String>,
}

impl<'a> OkrApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_objectives(&self, owner_id: Option<Uuid>) -> Result<Value, ClientError> {
        let mut query = Query::new();
        push_opt(&mut query, "owner_id", owner_id);
        self.client.get("/api/okr/objetivos", &query).await
    }

    pub async fn create_objective(
        &self,
        title: &str,
        description: Option<String>,
        period_start: &str,
        period_end: &str,
    ) -> Result<Value, ClientError> {
        let body = json!({
            "title": title,
            "description": description,
            "period_start": period_start,
            "period_end": period_end,
        });
        self.client.post("/api/okr/objetivos", Some(body)).await
    }

    pub async fn get_objective(&self, id: Uuid) -> Result<Value, ClientError> {
        self.client.get(&format!("/api/okr/objetivos/{id}"), &Query::new()).await
    }

    pub async fn create_key_result(&self, objective_id: Uuid, kr: NewKeyResult) -> Result<Value, ClientError> {
        let body = json!({
            "title": kr.title,
            "start_value": kr.start_value,
            "target_value": kr.target_value,
            "current_value": kr.start_value,
            "unit": kr.unit,
        });
        self.client.post(&format!("/api/okr/objetivos/{objective_id}/resultados-chave"), Some(body)).await
    }

    pub async fn check_in(&self, id: Uuid, current_value: f64) -> Result<Value, ClientError> {
        self.client
            .patch(&format!("/api/okr/resultados-chave/{id}"), json!({ "current_value": current_value }))
            .await
    }

    pub async fn list_tasks(&self, key_result_id: Uuid) -> Result<Value, ClientError> {
        self.client.get(&format!("/api/okr/resultados-chave/{key_result_id}/tarefas"), &Query::new()).await
    }

    pub async fn create_task(
        &self,
        key_result_id: Uuid,
        title: &str,
        parent_task_id: Option<Uuid>,
        due_date: Option<String>,
    ) -> Result<Value, ClientError> {
        let body = json!({ "title": title, "parent_task_id": parent_task_id, "due_date": due_date });
        self.client.post(&format!("/api/okr/resultados-chave/{key_result_id}/tarefas"), Some(body)).await
    }

    pub async fn set_task_done(&self, id: Uuid, done: bool) -> Result<Value, ClientError> {
        self.client.patch(&format!("/api/okr/tarefas/{id}"), json!({ "done": done })).await
    }
}
