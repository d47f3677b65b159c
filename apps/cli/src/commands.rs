//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use dcp_provider::{ProviderResolver, Sha256CredentialChecker, generate_dcp_id, hash_password};
use dcp_query::{
    NamedParameters, QueryParameters, parse_named_parameters, parse_query_parameters, sanitize,
    sanitize_query,
};
use dcp_shared::{AppConfig, init_config};
use dcp_storage::Storage;
use serde_json::Value;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DCP: query normalization and provider configuration.
#[derive(Parser)]
#[command(
    name = "dcp",
    version,
    about = "Normalize search queries and manage content provider configuration.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Provider database path (overrides `[storage] db_path`).
    #[arg(long, env = "DCP_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Query parameter normalization.
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },

    /// Provider configuration documents.
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Content type lookups.
    Type {
        #[command(subcommand)]
        action: TypeAction,
    },

    /// Print the system-wide content id for a dcp_type and a provider content id.
    Id {
        /// Canonical type tag (dcp_type).
        dcp_type: String,

        /// Provider-side content id.
        content_id: String,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Query subcommands.
#[derive(Subcommand)]
pub(crate) enum QueryAction {
    /// Canonicalize query text. Without text, prints the match-all sentinel.
    Sanitize {
        text: Option<String>,
    },

    /// Parse request parameters and print the normalized settings as JSON.
    Parse {
        /// Parameter as key=value (repeatable; repeated legacy keys are multi-valued).
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Use the strict REST parser instead of the legacy one.
        #[arg(long)]
        rest: bool,
    },
}

/// Provider subcommands.
#[derive(Subcommand)]
pub(crate) enum ProviderAction {
    /// Import provider documents from a JSON file (one object or an array).
    Import {
        file: PathBuf,
    },

    /// List stored provider documents.
    List,

    /// Show a provider's definition.
    Show {
        name: String,
    },

    /// Delete a stored document by id.
    Delete {
        id: String,
    },

    /// Check a provider's password.
    Auth {
        name: String,
        password: String,
    },

    /// Print the password hash to store as `pwd_hash`.
    Hash {
        name: String,
        password: String,
    },
}

/// Content type subcommands.
#[derive(Subcommand)]
pub(crate) enum TypeAction {
    /// Show a content type's configuration.
    Show {
        type_id: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags and the `[logging]` config section.
pub(crate) fn init_tracing(cli: &Cli, config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => config.logging.filter.as_str(),
        1 => "dcp=debug",
        _ => "dcp=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let db = cli.db;
    match cli.command {
        Command::Query { action } => match action {
            QueryAction::Sanitize { text } => cmd_query_sanitize(text.as_deref()),
            QueryAction::Parse { params, rest } => cmd_query_parse(params, rest),
        },
        // Hashing needs no database.
        Command::Provider {
            action: ProviderAction::Hash { name, password },
        } => cmd_provider_hash(&name, &password),
        Command::Provider { action } => {
            let storage = open_storage(db.as_deref(), &config).await?;
            match action {
                ProviderAction::Import { file } => cmd_provider_import(storage, &file).await,
                ProviderAction::List => cmd_provider_list(storage).await,
                ProviderAction::Show { name } => cmd_provider_show(storage, &name).await,
                ProviderAction::Delete { id } => cmd_provider_delete(storage, &id).await,
                ProviderAction::Auth { name, password } => {
                    cmd_provider_auth(storage, &name, &password).await
                }
                ProviderAction::Hash { name, password } => cmd_provider_hash(&name, &password),
            }
        }
        Command::Type { action } => match action {
            TypeAction::Show { type_id } => {
                let storage = open_storage(db.as_deref(), &config).await?;
                cmd_type_show(storage, &type_id).await
            }
        },
        Command::Id {
            dcp_type,
            content_id,
        } => {
            println!("{}", generate_dcp_id(&dcp_type, &content_id));
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Open the provider database, honoring `--db` and `[storage] readonly`.
async fn open_storage(db: Option<&Path>, config: &AppConfig) -> Result<Storage> {
    let path = match db {
        Some(p) => p.to_path_buf(),
        None => config.storage.resolved_db_path()?,
    };

    let storage = if config.storage.readonly {
        Storage::open_readonly(&path).await?
    } else {
        Storage::open(&path).await?
    };
    info!(path = %path.display(), readonly = config.storage.readonly, "opened provider database");
    Ok(storage)
}

fn resolver(storage: Storage) -> ProviderResolver {
    ProviderResolver::new(Arc::new(storage), Arc::new(Sha256CredentialChecker))
}

// ---------------------------------------------------------------------------
// Query commands
// ---------------------------------------------------------------------------

fn cmd_query_sanitize(text: Option<&str>) -> Result<()> {
    println!("{}", sanitize_query(text));
    Ok(())
}

fn cmd_query_parse(params: Vec<(String, String)>, rest: bool) -> Result<()> {
    let settings = if rest {
        let bag: QueryParameters = params.into_iter().collect();
        parse_query_parameters(Some(&bag))?
    } else {
        parse_named_parameters(Some(&group_params(params)))?
    };
    let settings = sanitize(Some(settings))?;

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Collect repeated keys into one multi-valued entry, preserving order.
fn group_params(params: Vec<(String, String)>) -> NamedParameters {
    let mut bag = NamedParameters::new();
    for (key, value) in params {
        bag.entry(key).or_default().push(value);
    }
    bag
}

// ---------------------------------------------------------------------------
// Provider commands
// ---------------------------------------------------------------------------

async fn cmd_provider_import(storage: Storage, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read {}", file.display()))?;
    let parsed: Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not valid JSON", file.display()))?;

    let docs = match parsed {
        Value::Array(docs) => docs,
        doc @ Value::Object(_) => vec![doc],
        _ => return Err(eyre!("expected a JSON object or an array of objects")),
    };

    info!(count = docs.len(), file = %file.display(), "importing provider documents");
    for doc in &docs {
        let id = storage.insert_document(doc).await?;
        let name = doc.get("name").and_then(Value::as_str).unwrap_or_default();
        println!("{id}  {name}");
    }
    Ok(())
}

async fn cmd_provider_list(storage: Storage) -> Result<()> {
    let docs = storage.list_documents().await?;
    if docs.is_empty() {
        println!("No provider documents stored.");
        return Ok(());
    }
    for doc in docs {
        println!("{}  {:<24} {}", doc.id, doc.name, doc.updated_at);
    }
    Ok(())
}

async fn cmd_provider_show(storage: Storage, name: &str) -> Result<()> {
    let provider = resolver(storage)
        .find_provider(name)
        .await?
        .ok_or_else(|| eyre!("provider '{name}' not found"))?;

    println!("{}", serde_json::to_string_pretty(&provider)?);
    Ok(())
}

async fn cmd_provider_delete(storage: Storage, id: &str) -> Result<()> {
    if !storage.delete_document(id).await? {
        return Err(eyre!("no document with id '{id}'"));
    }
    println!("Deleted {id}");
    Ok(())
}

async fn cmd_provider_auth(storage: Storage, name: &str, password: &str) -> Result<()> {
    if resolver(storage).authenticate(Some(name), Some(password)).await? {
        println!("Provider '{name}' authenticated.");
        Ok(())
    } else {
        Err(eyre!("authentication failed for provider '{name}'"))
    }
}

fn cmd_provider_hash(name: &str, password: &str) -> Result<()> {
    println!("{}", hash_password(name, password));
    Ok(())
}

// ---------------------------------------------------------------------------
// Type commands
// ---------------------------------------------------------------------------

async fn cmd_type_show(storage: Storage, type_id: &str) -> Result<()> {
    let type_def = resolver(storage)
        .find_content_type(type_id)
        .await?
        .ok_or_else(|| eyre!("content type '{type_id}' not found"))?;

    println!("  Type:          {}", type_def.id);
    println!("  dcp_type:      {}", type_def.dcp_type()?);
    println!("  Index name:    {}", type_def.index_name().unwrap_or("-"));
    println!("  Index type:    {}", type_def.index_type().unwrap_or("-"));
    println!("  Preprocessors: {}", type_def.preprocessors().len());
    for spec in type_def.preprocessors() {
        println!(
            "    - {} ({})",
            spec.name().unwrap_or("unnamed"),
            spec.class().unwrap_or("no class")
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
