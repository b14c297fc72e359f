mod api;
mod modules;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use uuid::Uuid;

use api::{ApiClient, ClientError};
use modules::{
    AuthApi, CadastrosApi, ContabilApi, FinanceiroApi, MovementQuery, NewAccount, NewEntry, NewKeyResult,
    NewMovement, OkrApi, Period,
};

#[derive(Parser, Debug)]
#[command(name = "gestao-cli", about = "Gestão empresarial: financeiro, contábil e OKR")]
struct Cli {
    #[arg(long, env = "GESTAO_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "GESTAO_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "GESTAO_TENANT_ID")]
    tenant: Option<Uuid>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Auth(AuthCommand),
    Empresas(EmpresasCommand),
    Permissoes,
    #[command(name = "centros-custo")]
    CentrosCusto(CentrosCustoCommand),
    #[command(name = "contas-bancarias")]
    ContasBancarias(ContasBancariasCommand),
    Movimentacoes(MovimentacoesCommand),
    Resumo(PeriodArgs),
    Contas(ContasCommand),
    Lancamentos(LancamentosCommand),
    Balancete(PeriodArgs),
    Objetivos(ObjetivosCommand),
    #[command(name = "resultados-chave")]
    ResultadosChave(ResultadosChaveCommand),
    Tarefas(TarefasCommand),
}

#[derive(Args, Debug, Clone)]
struct PeriodArgs {
    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,
    /// End date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,
}

impl From<PeriodArgs> for Period {
    fn from(args: PeriodArgs) -> Self {
        Self { from: args.from, to: args.to }
    }
}

// ---- auth ----

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirmation: String,
    },
    SignOut,
    Me,
}

// ---- cadastros ----

#[derive(Args, Debug)]
struct EmpresasCommand {
    #[command(subcommand)]
    command: EmpresasSubcommand,
}

#[derive(Subcommand, Debug)]
enum EmpresasSubcommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        legal_name: Option<String>,
        #[arg(long)]
        cnpj: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CentrosCustoCommand {
    #[command(subcommand)]
    command: CentrosCustoSubcommand,
}

#[derive(Subcommand, Debug)]
enum CentrosCustoSubcommand {
    List {
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
    },
}

// ---- financeiro ----

#[derive(Args, Debug)]
struct ContasBancariasCommand {
    #[command(subcommand)]
    command: ContasBancariasSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContasBancariasSubcommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        bank_name: Option<String>,
        #[arg(long, default_value_t = 0)]
        initial_balance_cents: i64,
    },
    Saldo {
        id: Uuid,
        #[arg(long)]
        until: Option<String>,
    },
}

#[derive(Args, Debug)]
struct MovimentacoesCommand {
    #[command(subcommand)]
    command: MovimentacoesSubcommand,
}

#[derive(Subcommand, Debug)]
enum MovimentacoesSubcommand {
    List {
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        bank_account_id: Option<Uuid>,
        #[arg(long)]
        q: Option<String>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    Create {
        /// `receita` or `despesa`.
        #[arg(long)]
        kind: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        amount_cents: i64,
        #[arg(long)]
        due_date: String,
        #[arg(long)]
        bank_account_id: Uuid,
        #[arg(long)]
        cost_center_id: Option<Uuid>,
    },
    Baixa {
        id: Uuid,
        /// Defaults to today on the server.
        #[arg(long)]
        paid_date: Option<String>,
    },
    Cancelar {
        id: Uuid,
    },
}

// ---- contabil ----

#[derive(Args, Debug)]
struct ContasCommand {
    #[command(subcommand)]
    command: ContasSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContasSubcommand {
    List {
        #[arg(long)]
        kind: Option<String>,
    },
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: String,
        /// Synthetic accounts group others and cannot receive entries.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
        #[arg(long)]
        parent_id: Option<Uuid>,
    },
    Razao {
        id: Uuid,
        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[derive(Args, Debug)]
struct LancamentosCommand {
    #[command(subcommand)]
    command: LancamentosSubcommand,
}

#[derive(Subcommand, Debug)]
enum LancamentosSubcommand {
    List {
        #[arg(long)]
        account_id: Option<Uuid>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    Create {
        #[arg(long)]
        date: String,
        #[arg(long)]
        debit: Uuid,
        #[arg(long)]
        credit: Uuid,
        #[arg(long)]
        amount_cents: i64,
        #[arg(long)]
        history: String,
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        cost_center_id: Option<Uuid>,
    },
    Delete {
        id: Uuid,
    },
}

// ---- okr ----

#[derive(Args, Debug)]
struct ObjetivosCommand {
    #[command(subcommand)]
    command: ObjetivosSubcommand,
}

#[derive(Subcommand, Debug)]
enum ObjetivosSubcommand {
    List {
        #[arg(long)]
        owner_id: Option<Uuid>,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        period_start: String,
        #[arg(long)]
        period_end: String,
    },
    Show {
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct ResultadosChaveCommand {
    #[command(subcommand)]
    command: ResultadosChaveSubcommand,
}

#[derive(Subcommand, Debug)]
enum ResultadosChaveSubcommand {
    Create {
        objective_id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        #[arg(long)]
        target: f64,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Record the current value of a key result.
    Update {
        id: Uuid,
        #[arg(long)]
        current: f64,
    },
}

#[derive(Args, Debug)]
struct TarefasCommand {
    #[command(subcommand)]
    command: TarefasSubcommand,
}

#[derive(Subcommand, Debug)]
enum TarefasSubcommand {
    List {
        key_result_id: Uuid,
    },
    Create {
        key_result_id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        parent_task_id: Option<Uuid>,
        #[arg(long)]
        due_date: Option<String>,
    },
    Done {
        id: Uuid,
        /// Pass `--undo` to reopen the task.
        #[arg(long, default_value_t = false)]
        undo: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.base_url, cli.token, cli.tenant);

    match run(&client, cli.command).await.and_then(|json| print_json(&json)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("erro: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &ApiClient, command: Command) -> Result<Value, ClientError> {
    match command {
        Command::Ping => {
            let builder = client.request(reqwest::Method::GET, "/healthz")?;
            client.send(builder, None).await
        }
        Command::Auth(auth) => run_auth(client, auth.command).await,
        Command::Empresas(empresas) => run_empresas(client, empresas.command).await,
        Command::Permissoes => CadastrosApi::new(client).permissions().await,
        Command::CentrosCusto(centros) => run_centros_custo(client, centros.command).await,
        Command::ContasBancarias(contas) => run_contas_bancarias(client, contas.command).await,
        Command::Movimentacoes(movs) => run_movimentacoes(client, movs.command).await,
        Command::Resumo(period) => FinanceiroApi::new(client).summary(period.into()).await,
        Command::Contas(contas) => run_contas(client, contas.command).await,
        Command::Lancamentos(lancamentos) => run_lancamentos(client, lancamentos.command).await,
        Command::Balancete(period) => ContabilApi::new(client).balancete(period.into()).await,
        Command::Objetivos(objetivos) => run_objetivos(client, objetivos.command).await,
        Command::ResultadosChave(krs) => run_resultados_chave(client, krs.command).await,
        Command::Tarefas(tarefas) => run_tarefas(client, tarefas.command).await,
    }
}

async fn run_auth(client: &ApiClient, command: AuthSubcommand) -> Result<Value, ClientError> {
    let api = AuthApi::new(client);
    match command {
        AuthSubcommand::SignIn { email, password } => api.sign_in(&email, &password).await,
        AuthSubcommand::SignUp { name, email, password, password_confirmation } => {
            api.sign_up(&name, &email, &password, &password_confirmation).await
        }
        AuthSubcommand::SignOut => api.sign_out().await,
        AuthSubcommand::Me => api.me().await,
    }
}

async fn run_empresas(client: &ApiClient, command: EmpresasSubcommand) -> Result<Value, ClientError> {
    let api = CadastrosApi::new(client);
    match command {
        EmpresasSubcommand::List => api.list_companies().await,
        EmpresasSubcommand::Create { name, legal_name, cnpj } => api.create_company(&name, legal_name, cnpj).await,
    }
}

async fn run_centros_custo(client: &ApiClient, command: CentrosCustoSubcommand) -> Result<Value, ClientError> {
    let api = CadastrosApi::new(client);
    match command {
        CentrosCustoSubcommand::List { q, active } => api.list_cost_centers(q, active).await,
        CentrosCustoSubcommand::Create { code, name } => api.create_cost_center(&code, &name).await,
    }
}

async fn run_contas_bancarias(client: &ApiClient, command: ContasBancariasSubcommand) -> Result<Value, ClientError> {
    let api = FinanceiroApi::new(client);
    match command {
        ContasBancariasSubcommand::List => api.list_bank_accounts().await,
        ContasBancariasSubcommand::Create { name, bank_name, initial_balance_cents } => {
            api.create_bank_account(&name, bank_name, initial_balance_cents).await
        }
        ContasBancariasSubcommand::Saldo { id, until } => api.balance(id, until).await,
    }
}

async fn run_movimentacoes(client: &ApiClient, command: MovimentacoesSubcommand) -> Result<Value, ClientError> {
    let api = FinanceiroApi::new(client);
    match command {
        MovimentacoesSubcommand::List { kind, status, bank_account_id, q, period } => {
            api.list_movements(MovementQuery { kind, status, bank_account_id, q, period: period.into() }).await
        }
        MovimentacoesSubcommand::Create {
            kind,
            description,
            category,
            amount_cents,
            due_date,
            bank_account_id,
            cost_center_id,
        } => {
            api.create_movement(NewMovement {
                kind,
                description,
                category,
                amount_cents,
                due_date,
                bank_account_id,
                cost_center_id,
            })
            .await
        }
        MovimentacoesSubcommand::Baixa { id, paid_date } => api.settle(id, paid_date).await,
        MovimentacoesSubcommand::Cancelar { id } => api.cancel(id).await,
    }
}

async fn run_contas(client: &ApiClient, command: ContasSubcommand) -> Result<Value, ClientError> {
    let api = ContabilApi::new(client);
    match command {
        ContasSubcommand::List { kind } => api.list_accounts(kind).await,
        ContasSubcommand::Create { code, name, kind, synthetic, parent_id } => {
            api.create_account(NewAccount { code, name, kind, analytic: !synthetic, parent_id }).await
        }
        ContasSubcommand::Razao { id, period } => api.razao(id, period.into()).await,
    }
}

async fn run_lancamentos(client: &ApiClient, command: LancamentosSubcommand) -> Result<Value, ClientError> {
    let api = ContabilApi::new(client);
    match command {
        LancamentosSubcommand::List { account_id, period } => api.list_entries(account_id, period.into()).await,
        LancamentosSubcommand::Create { date, debit, credit, amount_cents, history, document, cost_center_id } => {
            api.create_entry(NewEntry {
                entry_date: date,
                debit_account_id: debit,
                credit_account_id: credit,
                amount_cents,
                history,
                document,
                cost_center_id,
            })
            .await
        }
        LancamentosSubcommand::Delete { id } => api.delete_entry(id).await,
    }
}

async fn run_objetivos(client: &ApiClient, command: ObjetivosSubcommand) -> Result<Value, ClientError> {
    let api = OkrApi::new(client);
    match command {
        ObjetivosSubcommand::List { owner_id } => api.list_objectives(owner_id).await,
        ObjetivosSubcommand::Create { title, description, period_start, period_end } => {
            api.create_objective(&title, description, &period_start, &period_end).await
        }
        ObjetivosSubcommand::Show { id } => api.get_objective(id).await,
    }
}

async fn run_resultados_chave(client: &ApiClient, command: ResultadosChaveSubcommand) -> Result<Value, ClientError> {
    let api = OkrApi::new(client);
    match command {
        ResultadosChaveSubcommand::Create { objective_id, title, start, target, unit } => {
            api.create_key_result(objective_id, NewKeyResult { title, start_value: start, target_value: target, unit })
                .await
        }
        ResultadosChaveSubcommand::Update { id, current } => api.check_in(id, current).await,
    }
}

async fn run_tarefas(client: &ApiClient, command: TarefasSubcommand) -> Result<Value, ClientError> {
    let api = OkrApi::new(client);
    match command {
        TarefasSubcommand::List { key_result_id } => api.list_tasks(key_result_id).await,
        TarefasSubcommand::Create { key_result_id, title, parent_task_id, due_date } => {
            api.create_task(key_result_id, &title, parent_task_id, due_date).await
        }
        TarefasSubcommand::Done { id, undo } => api.set_task_done(id, !undo).await,
    }
}

fn print_json(value: &Value) -> Result<(), ClientError> {
    if value.is_null() {
        println!("ok");
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
