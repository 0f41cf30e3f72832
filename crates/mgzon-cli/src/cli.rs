//! Argument parsing and command dispatch for `mz`.

use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use mgzon_config::ConfigStore;
use reqwest::Url;
use uuid::Uuid;

use crate::client::{
    AppContext, CliError, CliResult, ENV_API_KEY, build_http_client, parse_url,
};
use crate::commands::{
    apps, auth, config, db, deploy, keys, misc, project, storage, webhooks,
};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const ENV_API_URL: &str = "MGZON_API_URL";
pub(crate) const ENV_CONFIG_PATH: &str = "MGZON_CONFIG_PATH";

/// Parses CLI arguments, executes the requested command, and renders any
/// error to stderr. Returns the process exit code: 0 on success, 1 on auth
/// failure or any unhandled error.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();
    tracing::debug!(command = command_label(&cli.command), %trace_id, "dispatching");

    match dispatch(cli, &trace_id).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<()> {
    let client = build_http_client(cli.timeout, trace_id)?;

    let store = match env::var(ENV_CONFIG_PATH) {
        Ok(path) => ConfigStore::at_path(path),
        Err(_) => ConfigStore::default_location()?,
    };
    let config = store.load()?;

    let base_url = match cli.api_url {
        Some(url) => url,
        None => config
            .api_url()
            .parse::<Url>()
            .map_err(|err| {
                CliError::validation(format!(
                    "config apiUrl '{}' is not a valid URL: {err}",
                    config.api_url()
                ))
            })?,
    };

    let ctx = AppContext {
        client,
        base_url,
        store,
        config,
        api_key_override: cli.api_key,
    };

    match cli.command {
        Command::Login(args) => auth::handle_login(&ctx, args).await,
        Command::Logout => auth::handle_logout(&ctx).await,
        Command::Setup => auth::handle_setup(&ctx).await,
        Command::Whoami => auth::handle_whoami(&ctx, cli.output).await,
        Command::Init(args) => project::handle_init(&ctx, args),
        Command::Serve(args) => project::handle_serve(args).await,
        Command::Build(args) => deploy::handle_build(args),
        Command::Deploy(args) => deploy::handle_deploy(&ctx, args).await,
        Command::Generate(generate) => match generate {
            GenerateCommand::WebhookHandler(args) => project::handle_generate_webhook(args),
            GenerateCommand::Dockerfile(args) => project::handle_generate_dockerfile(args),
        },
        Command::Webhook(webhook) => match webhook {
            WebhookCommand::List => webhooks::handle_list(&ctx, cli.output).await,
            WebhookCommand::Create(args) => webhooks::handle_create(&ctx, args).await,
            WebhookCommand::Delete(args) => webhooks::handle_delete(&ctx, args).await,
            WebhookCommand::Test(args) => webhooks::handle_test(&ctx, args).await,
        },
        Command::Config(command) => match command {
            ConfigCommand::Get(args) => config::handle_get(&ctx, &args),
            ConfigCommand::Set(args) => config::handle_set(&ctx, args),
            ConfigCommand::List => config::handle_list(&ctx, cli.output),
            ConfigCommand::Path => config::handle_path(&ctx),
            ConfigCommand::Clear => config::handle_clear(&ctx),
        },
        Command::Keys(command) => match command {
            KeysCommand::List => keys::handle_list(&ctx, cli.output).await,
            KeysCommand::Create(args) => keys::handle_create(&ctx, args).await,
            KeysCommand::Revoke(args) => keys::handle_revoke(&ctx, args).await,
        },
        Command::Apps(command) => match command {
            AppsCommand::List => apps::handle_list(&ctx, cli.output).await,
            AppsCommand::Create(args) => apps::handle_create(&ctx, args).await,
            AppsCommand::Info(args) => apps::handle_info(&ctx, args, cli.output).await,
            AppsCommand::Delete(args) => apps::handle_delete(&ctx, args).await,
        },
        Command::Db(command) => match command {
            DbCommand::Query(args) => db::handle_query(&ctx, args, cli.output).await,
            DbCommand::Run(args) => db::handle_run(&ctx, args, cli.output).await,
        },
        Command::Storage(command) => match command {
            StorageCommand::List => storage::handle_list(&ctx, cli.output).await,
            StorageCommand::Upload(args) => storage::handle_upload(&ctx, args).await,
            StorageCommand::Download(args) => storage::handle_download(&ctx, args).await,
            StorageCommand::Delete(args) => storage::handle_delete(&ctx, args).await,
        },
        Command::Update => misc::handle_update(&ctx).await,
        Command::Debug => misc::handle_debug(&ctx).await,
        Command::Docs => {
            misc::handle_docs();
            Ok(())
        }
        Command::Support => {
            misc::handle_support();
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(name = "mz", version, about = "Command-line client for the MGZON platform")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = ENV_API_URL,
        value_parser = parse_url,
        help = "API base URL; defaults to the config apiUrl"
    )]
    pub(crate) api_url: Option<Url>,
    #[arg(long, global = true, env = ENV_API_KEY, hide_env_values = true)]
    pub(crate) api_key: Option<String>,
    #[arg(
        long,
        global = true,
        env = "MGZON_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Authenticate with an API key and store the session locally
    Login(LoginArgs),
    /// End the session and clear stored credentials
    Logout,
    /// Interactive first-run configuration
    Setup,
    /// Show the currently authenticated user
    Whoami,
    /// Scaffold an mgzon.json project manifest in the current directory
    Init(InitArgs),
    /// Serve the project directory locally for preview
    Serve(ServeArgs),
    /// Package the project into a deployable archive
    Build(BuildArgs),
    /// Package the project and upload it to the platform
    Deploy(DeployArgs),
    /// Generate local scaffolding files
    #[command(subcommand)]
    Generate(GenerateCommand),
    /// Manage webhook registrations
    #[command(subcommand)]
    Webhook(WebhookCommand),
    /// Inspect or edit the local configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage API keys
    #[command(subcommand)]
    Keys(KeysCommand),
    /// Manage applications
    #[command(subcommand)]
    Apps(AppsCommand),
    /// Run database queries and operations
    #[command(subcommand)]
    Db(DbCommand),
    /// Manage file storage
    #[command(subcommand)]
    Storage(StorageCommand),
    /// Check whether a newer CLI release is available
    Update,
    /// Print diagnostic information and probe connectivity
    Debug,
    /// Print documentation links
    Docs,
    /// Print support channels
    Support,
}

#[derive(Args, Default)]
pub(crate) struct LoginArgs {
    #[arg(help = "API key; prompted for when omitted")]
    pub(crate) key: Option<String>,
}

#[derive(Args)]
pub(crate) struct InitArgs {
    #[arg(help = "Project name; defaults to the directory name")]
    pub(crate) name: Option<String>,
    #[arg(long, help = "Default environment recorded in the manifest")]
    pub(crate) environment: Option<String>,
    #[arg(long, help = "Overwrite an existing manifest")]
    pub(crate) force: bool,
}

#[derive(Args)]
pub(crate) struct ServeArgs {
    #[arg(default_value = ".", help = "Directory to serve")]
    pub(crate) dir: PathBuf,
    #[arg(long, default_value_t = 4100)]
    pub(crate) port: u16,
}

#[derive(Args)]
pub(crate) struct BuildArgs {
    #[arg(default_value = ".", help = "Project directory to package")]
    pub(crate) dir: PathBuf,
    #[arg(long, help = "Archive path; defaults to .mgzon/build.zip in the project")]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct DeployArgs {
    #[arg(default_value = ".", help = "Project directory to package and upload")]
    pub(crate) dir: PathBuf,
    #[arg(long, help = "Upload an existing archive instead of packaging")]
    pub(crate) archive: Option<PathBuf>,
    #[arg(long, help = "Target environment; defaults to config defaultEnvironment")]
    pub(crate) environment: Option<String>,
    #[arg(long, help = "Project name; defaults to the manifest, then config currentProject")]
    pub(crate) project: Option<String>,
    #[arg(long, help = "Keep the packaged archive after upload")]
    pub(crate) keep_archive: bool,
}

#[derive(Subcommand)]
pub(crate) enum GenerateCommand {
    /// Write a webhook handler stub into the project
    WebhookHandler(GenerateWebhookArgs),
    /// Write a Dockerfile suited for MGZON deployments
    Dockerfile(GenerateDockerfileArgs),
}

#[derive(Args)]
pub(crate) struct GenerateWebhookArgs {
    #[arg(help = "Handler name, e.g. order-created")]
    pub(crate) name: String,
    #[arg(long, help = "Overwrite an existing file")]
    pub(crate) force: bool,
}

#[derive(Args)]
pub(crate) struct GenerateDockerfileArgs {
    #[arg(long, help = "Overwrite an existing file")]
    pub(crate) force: bool,
}

#[derive(Subcommand)]
pub(crate) enum WebhookCommand {
    /// List registered webhooks
    List,
    /// Register a new webhook
    Create(WebhookCreateArgs),
    /// Delete a webhook
    Delete(WebhookIdArgs),
    /// Ask the platform to fire a test delivery
    Test(WebhookIdArgs),
}

#[derive(Args)]
pub(crate) struct WebhookCreateArgs {
    #[arg(long, help = "Destination URL for deliveries")]
    pub(crate) url: String,
    #[arg(long, value_delimiter = ',', help = "Event names to subscribe to")]
    pub(crate) events: Vec<String>,
}

#[derive(Args)]
pub(crate) struct WebhookIdArgs {
    #[arg(help = "Webhook identifier")]
    pub(crate) id: String,
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Print one configuration value
    Get(ConfigKeyArgs),
    /// Set one configuration value
    Set(ConfigSetArgs),
    /// Print the whole configuration record (secrets redacted)
    List,
    /// Print the path of the configuration file
    Path,
    /// Reset the configuration file to defaults
    Clear,
}

#[derive(Args)]
pub(crate) struct ConfigKeyArgs {
    #[arg(help = "Configuration key, e.g. apiUrl")]
    pub(crate) key: String,
}

#[derive(Args)]
pub(crate) struct ConfigSetArgs {
    #[arg(help = "Configuration key, e.g. theme")]
    pub(crate) key: String,
    #[arg(help = "New value")]
    pub(crate) value: String,
}

#[derive(Subcommand)]
pub(crate) enum KeysCommand {
    /// List API keys
    List,
    /// Create a new API key
    Create(KeyCreateArgs),
    /// Revoke an API key
    Revoke(KeyIdArgs),
}

#[derive(Args)]
pub(crate) struct KeyCreateArgs {
    #[arg(long, help = "Human label for the new key")]
    pub(crate) label: String,
}

#[derive(Args)]
pub(crate) struct KeyIdArgs {
    #[arg(help = "Key identifier")]
    pub(crate) id: String,
}

#[derive(Subcommand)]
pub(crate) enum AppsCommand {
    /// List applications
    List,
    /// Create an application
    Create(AppCreateArgs),
    /// Show one application
    Info(AppIdArgs),
    /// Delete an application
    Delete(AppIdArgs),
}

#[derive(Args)]
pub(crate) struct AppCreateArgs {
    #[arg(help = "Application name")]
    pub(crate) name: String,
    #[arg(long, help = "Target environment; account default when omitted")]
    pub(crate) environment: Option<String>,
}

#[derive(Args)]
pub(crate) struct AppIdArgs {
    #[arg(help = "Application identifier")]
    pub(crate) id: String,
}

#[derive(Subcommand)]
pub(crate) enum DbCommand {
    /// Query documents from a collection
    Query(DbQueryArgs),
    /// Run a database operation from a JSON document
    Run(DbRunArgs),
}

#[derive(Args)]
pub(crate) struct DbQueryArgs {
    #[arg(long, help = "Collection to query")]
    pub(crate) collection: String,
    #[arg(long, help = "JSON filter document")]
    pub(crate) filter: Option<String>,
    #[arg(long, help = "Maximum number of documents")]
    pub(crate) limit: Option<u32>,
}

#[derive(Args)]
pub(crate) struct DbRunArgs {
    #[arg(help = "Inline JSON operation document")]
    pub(crate) op: Option<String>,
    #[arg(short = 'f', long = "file", help = "Read the operation document from a file")]
    pub(crate) file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum StorageCommand {
    /// List stored objects
    List,
    /// Upload a file
    Upload(StorageUploadArgs),
    /// Download an object
    Download(StorageDownloadArgs),
    /// Delete an object
    Delete(StorageNameArgs),
}

#[derive(Args)]
pub(crate) struct StorageUploadArgs {
    #[arg(help = "Local file to upload")]
    pub(crate) file: PathBuf,
    #[arg(long, help = "Object name; defaults to the file name")]
    pub(crate) name: Option<String>,
    #[arg(long, help = "Content type recorded with the object")]
    pub(crate) content_type: Option<String>,
}

#[derive(Args)]
pub(crate) struct StorageDownloadArgs {
    #[arg(help = "Object name")]
    pub(crate) name: String,
    #[arg(long, help = "Local path to write; defaults to the object name")]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct StorageNameArgs {
    #[arg(help = "Object name")]
    pub(crate) name: String,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Setup => "setup",
        Command::Whoami => "whoami",
        Command::Init(_) => "init",
        Command::Serve(_) => "serve",
        Command::Build(_) => "build",
        Command::Deploy(_) => "deploy",
        Command::Generate(GenerateCommand::WebhookHandler(_)) => "generate_webhook_handler",
        Command::Generate(GenerateCommand::Dockerfile(_)) => "generate_dockerfile",
        Command::Webhook(WebhookCommand::List) => "webhook_list",
        Command::Webhook(WebhookCommand::Create(_)) => "webhook_create",
        Command::Webhook(WebhookCommand::Delete(_)) => "webhook_delete",
        Command::Webhook(WebhookCommand::Test(_)) => "webhook_test",
        Command::Config(ConfigCommand::Get(_)) => "config_get",
        Command::Config(ConfigCommand::Set(_)) => "config_set",
        Command::Config(ConfigCommand::List) => "config_list",
        Command::Config(ConfigCommand::Path) => "config_path",
        Command::Config(ConfigCommand::Clear) => "config_clear",
        Command::Keys(KeysCommand::List) => "keys_list",
        Command::Keys(KeysCommand::Create(_)) => "keys_create",
        Command::Keys(KeysCommand::Revoke(_)) => "keys_revoke",
        Command::Apps(AppsCommand::List) => "apps_list",
        Command::Apps(AppsCommand::Create(_)) => "apps_create",
        Command::Apps(AppsCommand::Info(_)) => "apps_info",
        Command::Apps(AppsCommand::Delete(_)) => "apps_delete",
        Command::Db(DbCommand::Query(_)) => "db_query",
        Command::Db(DbCommand::Run(_)) => "db_run",
        Command::Storage(StorageCommand::List) => "storage_list",
        Command::Storage(StorageCommand::Upload(_)) => "storage_upload",
        Command::Storage(StorageCommand::Download(_)) => "storage_download",
        Command::Storage(StorageCommand::Delete(_)) => "storage_delete",
        Command::Update => "update",
        Command::Debug => "debug",
        Command::Docs => "docs",
        Command::Support => "support",
    }
}
