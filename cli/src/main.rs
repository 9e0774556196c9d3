use std::path::PathBuf;

use admin_console::config::{ConfigError, ConsoleConfig, DEFAULT_API_URL, HttpTimeouts, default_state_dir};
use admin_console::net::http::ApiError;
use admin_console::net::types::{Credentials, EndpointTest, RecordId, TemplateBatch};
use admin_console::router::HOME_PATH;
use admin_console::router::navigator::NavigationError;
use admin_console::state::auth::AuthError;
use admin_console::{Console, ConsoleError};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("session expired; run `admin-cli login` again")]
    SessionExpired,
    #[error(transparent)]
    Api(ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("login required; run `admin-cli login` first")]
    LoginRequired,
    #[error("admin privileges required for {0}")]
    AdminRequired(String),
    #[error("missing password; pass --password or set ADMIN_PASSWORD")]
    MissingPassword,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => Self::SessionExpired,
            other => Self::Api(other),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "admin-cli", about = "Admin console for the model-serving backend")]
struct Cli {
    #[arg(long, env = "ADMIN_API_URL", default_value = DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = "ADMIN_STATE_DIR", help = "Directory for the saved session and cookies")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    /// Verify the saved session against the backend and print the user.
    Whoami,
    /// Show where navigating to PATH would land.
    Route {
        path: String,
    },
    Users(UsersCommand),
    ApiKeys(ApiKeysCommand),
    Endpoints(EndpointsCommand),
    Knowledge(KnowledgeCommand),
    Chunks(ChunksCommand),
    Models(ModelsCommand),
    Templates(TemplatesCommand),
    Services(ServicesCommand),
    Dashboard,
}

/// Shared CRUD verbs; `--data` takes a JSON object.
#[derive(Subcommand, Debug)]
enum CrudSubcommand {
    List,
    Get {
        id: RecordId,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: RecordId,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: RecordId,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

/// Verbs for the admin-only collections (no single-record fetch).
#[derive(Subcommand, Debug)]
enum AccountSubcommand {
    List,
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: RecordId,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: RecordId,
    },
}

#[derive(Args, Debug)]
struct ApiKeysCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Args, Debug)]
struct EndpointsCommand {
    #[command(subcommand)]
    command: EndpointsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EndpointsSubcommand {
    #[command(flatten)]
    Crud(CrudSubcommand),
    /// Execute a test call against an endpoint.
    Test {
        id: RecordId,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        data: Option<String>,
    },
}

#[derive(Args, Debug)]
struct KnowledgeCommand {
    #[command(subcommand)]
    command: KnowledgeSubcommand,
}

#[derive(Subcommand, Debug)]
enum KnowledgeSubcommand {
    #[command(flatten)]
    Crud(CrudSubcommand),
    /// Import every markdown file in a directory on the backend host.
    ImportDir {
        directory: String,
    },
    Upload {
        file: PathBuf,
    },
    Index {
        id: RecordId,
    },
}

#[derive(Args, Debug)]
struct ChunksCommand {
    #[command(subcommand)]
    command: ChunksSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChunksSubcommand {
    List {
        #[arg(long)]
        knowledge_base: Option<RecordId>,
    },
    Get {
        id: RecordId,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: RecordId,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: RecordId,
    },
    Vectorize {
        id: RecordId,
    },
}

#[derive(Args, Debug)]
struct ModelsCommand {
    #[command(subcommand)]
    command: ModelsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ModelsSubcommand {
    #[command(flatten)]
    Crud(CrudSubcommand),
    Activate {
        id: RecordId,
    },
    Reload {
        id: RecordId,
    },
}

#[derive(Args, Debug)]
struct TemplatesCommand {
    #[command(subcommand)]
    command: TemplatesSubcommand,
}

#[derive(Subcommand, Debug)]
enum TemplatesSubcommand {
    #[command(flatten)]
    Crud(CrudSubcommand),
    Categories,
    RefreshCache,
    Reset,
    /// Replace contents from `{category: {type: content}}`.
    BatchUpdate {
        #[arg(long)]
        data: String,
    },
}

#[derive(Args, Debug)]
struct ServicesCommand {
    #[command(subcommand)]
    command: ServicesSubcommand,
}

#[derive(Subcommand, Debug)]
enum ServicesSubcommand {
    #[command(flatten)]
    Crud(CrudSubcommand),
    Start {
        id: RecordId,
    },
    Stop {
        id: RecordId,
    },
    /// Re-probe every service process.
    Refresh,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let console = Console::new(&config)?;

    let result = run(&console, cli.command).await;

    if let Some(outcome) = console.navigator().settle().await {
        tracing::debug!(?outcome, "session verification settled");
    }
    console.persist_cookies();
    result
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig, CliError> {
    let state_dir = match &cli.state_dir {
        Some(dir) => dir.clone(),
        None => default_state_dir()?,
    };
    Ok(ConsoleConfig::new(&cli.base_url, state_dir).with_timeouts(HttpTimeouts::from_env()))
}

async fn run(console: &Console, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            let user = console
                .sessions()
                .login(&Credentials::new(username, password))
                .await?;
            print_json(&user)
        }
        Command::Logout => {
            console.sessions().logout().await?;
            print_json(&serde_json::json!({ "status": "logged out" }))
        }
        Command::Whoami => {
            let outcome = console.sessions().init_auth().await;
            tracing::info!(?outcome, "session checked");
            let user = console.sessions().user().ok_or(CliError::LoginRequired)?;
            print_json(&user)
        }
        Command::Route { path } => {
            let location = console.navigator().push(&path)?;
            print_json(&serde_json::json!({
                "requested": path,
                "path": location.path,
                "name": location.name,
                "redirected_from": location.redirected_from,
            }))
        }
        Command::Users(users) => run_users(console, users).await,
        Command::ApiKeys(keys) => run_api_keys(console, keys).await,
        Command::Endpoints(endpoints) => run_endpoints(console, endpoints).await,
        Command::Knowledge(knowledge) => run_knowledge(console, knowledge).await,
        Command::Chunks(chunks) => run_chunks(console, chunks).await,
        Command::Models(models) => run_models(console, models).await,
        Command::Templates(templates) => run_templates(console, templates).await,
        Command::Services(services) => run_services(console, services).await,
        Command::Dashboard => {
            enter_view(console, HOME_PATH)?;
            print_json(&console.dashboard().statistics().await?)
        }
    }
}

/// Navigate to the view owning a command; a guard redirect becomes an error.
fn enter_view(console: &Console, path: &str) -> Result<(), CliError> {
    let location = console.navigator().push(path)?;
    if location.redirected_from.is_none() {
        return Ok(());
    }
    if location.is_login() { Err(CliError::LoginRequired) } else { Err(CliError::AdminRequired(path.to_owned())) }
}

async fn run_users(console: &Console, users: UsersCommand) -> Result<(), CliError> {
    enter_view(console, "/users")?;
    let api = console.users();
    match users.command {
        AccountSubcommand::List => print_json(&api.list().await?),
        AccountSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
        AccountSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
        AccountSubcommand::Delete { id } => print_json(&api.delete(id).await?),
    }
}

async fn run_api_keys(console: &Console, keys: ApiKeysCommand) -> Result<(), CliError> {
    enter_view(console, "/api-keys")?;
    let api = console.api_keys();
    match keys.command {
        AccountSubcommand::List => print_json(&api.list().await?),
        AccountSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
        AccountSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
        AccountSubcommand::Delete { id } => print_json(&api.delete(id).await?),
    }
}

async fn run_endpoints(console: &Console, endpoints: EndpointsCommand) -> Result<(), CliError> {
    enter_view(console, "/api")?;
    let api = console.endpoints();
    match endpoints.command {
        EndpointsSubcommand::Crud(crud) => match crud {
            CrudSubcommand::List => print_json(&api.list().await?),
            CrudSubcommand::Get { id } => print_json(&api.get(id).await?),
            CrudSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
            CrudSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
            CrudSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        },
        EndpointsSubcommand::Test { id, api_key, data } => {
            let body = data.as_deref().map(parse_json).transpose()?;
            let test = EndpointTest { endpoint_id: id, api_key, body };
            print_json(&api.test(test).await?)
        }
    }
}

async fn run_knowledge(console: &Console, knowledge: KnowledgeCommand) -> Result<(), CliError> {
    enter_view(console, "/knowledge")?;
    let api = console.knowledge();
    match knowledge.command {
        KnowledgeSubcommand::Crud(crud) => match crud {
            CrudSubcommand::List => print_json(&console.catalog().fetch_knowledge_bases().await?),
            CrudSubcommand::Get { id } => print_json(&api.get(id).await?),
            CrudSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
            CrudSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
            CrudSubcommand::Delete { id } => print_json(&console.catalog().delete_knowledge_base(id).await?),
        },
        KnowledgeSubcommand::ImportDir { directory } => print_json(&api.import_directory(&directory).await?),
        KnowledgeSubcommand::Upload { file } => print_json(&api.upload(&file).await?),
        KnowledgeSubcommand::Index { id } => print_json(&api.index(id).await?),
    }
}

async fn run_chunks(console: &Console, chunks: ChunksCommand) -> Result<(), CliError> {
    enter_view(console, "/knowledge")?;
    let api = console.chunks();
    match chunks.command {
        ChunksSubcommand::List { knowledge_base } => print_json(&api.list(knowledge_base).await?),
        ChunksSubcommand::Get { id } => print_json(&api.get(id).await?),
        ChunksSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
        ChunksSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
        ChunksSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        ChunksSubcommand::Vectorize { id } => print_json(&api.vectorize(id).await?),
    }
}

async fn run_models(console: &Console, models: ModelsCommand) -> Result<(), CliError> {
    enter_view(console, "/models")?;
    let api = console.models();
    match models.command {
        ModelsSubcommand::Crud(crud) => match crud {
            CrudSubcommand::List => print_json(&api.list().await?),
            CrudSubcommand::Get { id } => print_json(&api.get(id).await?),
            CrudSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
            CrudSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
            CrudSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        },
        ModelsSubcommand::Activate { id } => print_json(&api.activate(id).await?),
        ModelsSubcommand::Reload { id } => print_json(&api.reload(id).await?),
    }
}

async fn run_templates(console: &Console, templates: TemplatesCommand) -> Result<(), CliError> {
    enter_view(console, "/prompts")?;
    let api = console.templates();
    match templates.command {
        TemplatesSubcommand::Crud(crud) => match crud {
            CrudSubcommand::List => print_json(&console.catalog().fetch_prompt_templates().await?),
            CrudSubcommand::Get { id } => print_json(&api.get(id).await?),
            CrudSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
            CrudSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
            CrudSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        },
        TemplatesSubcommand::Categories => print_json(&console.catalog().fetch_prompt_categories().await?),
        TemplatesSubcommand::RefreshCache => print_json(&api.refresh_cache().await?),
        TemplatesSubcommand::Reset => print_json(&api.reset().await?),
        TemplatesSubcommand::BatchUpdate { data } => {
            let batch: TemplateBatch = serde_json::from_str(&data)?;
            print_json(&api.batch_update(&batch).await?)
        }
    }
}

async fn run_services(console: &Console, services: ServicesCommand) -> Result<(), CliError> {
    enter_view(console, "/services")?;
    let api = console.services();
    match services.command {
        ServicesSubcommand::Crud(crud) => match crud {
            CrudSubcommand::List => print_json(&api.list().await?),
            CrudSubcommand::Get { id } => print_json(&api.get(id).await?),
            CrudSubcommand::Create { data } => print_json(&api.create(&parse_json(&data)?).await?),
            CrudSubcommand::Update { id, data } => print_json(&api.update(id, &parse_json(&data)?).await?),
            CrudSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        },
        ServicesSubcommand::Start { id } => print_json(&api.start(id).await?),
        ServicesSubcommand::Stop { id } => print_json(&api.stop(id).await?),
        ServicesSubcommand::Refresh => print_json(&api.refresh_status().await?),
    }
}

fn parse_json(data: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str::<Value>(data)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_api_error_reads_as_expired_session() {
        assert!(matches!(CliError::from(ApiError::Unauthorized), CliError::SessionExpired));
        assert!(matches!(CliError::from(ApiError::Network("x".into())), CliError::Api(_)));
    }

    #[test]
    fn parse_json_rejects_garbage() {
        assert!(matches!(parse_json("{nope"), Err(CliError::InvalidJson(_))));
        assert_eq!(parse_json(r#"{"a":1}"#).unwrap(), serde_json::json!({ "a": 1 }));
    }

    #[test]
    fn cli_parses_nested_crud_commands() {
        let cli = Cli::try_parse_from(["admin-cli", "models", "update", "3", "--data", "{}"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Models(ModelsCommand { command: ModelsSubcommand::Crud(CrudSubcommand::Update { id: 3, .. }) })
        ));
    }

    #[test]
    fn cli_parses_endpoint_test() {
        let cli = Cli::try_parse_from(["admin-cli", "endpoints", "test", "9", "--api-key", "k"]).unwrap();
        let Command::Endpoints(EndpointsCommand { command: EndpointsSubcommand::Test { id, api_key, data } }) =
            cli.command
        else {
            panic!("expected endpoints test");
        };
        assert_eq!(id, 9);
        assert_eq!(api_key.as_deref(), Some("k"));
        assert_eq!(data, None);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
