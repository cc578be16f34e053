//! CLI command definitions for social-support.
//!
//! The binary plays the part of the bot host: it builds the persistence
//! backend, activates the plugin from a YAML file or the environment and
//! feeds it chat lines.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::{
    self, PluginSettings, SocialSupportConfig, DEFAULT_FETCH_LIMIT, REQUIRED_KEYS,
};
use crate::metrics::{export_metrics, init_metrics};
use crate::plugin::PluginHost;
use crate::store::{self, KeyValueStore, MemoryStore, RedisStore, SqliteStore};
use crate::twitter::{TweetSource, TwitterSearchClient};
use crate::zendesk::ZendeskClient;

/// Default SQLite database file.
const DEFAULT_SQLITE_PATH: &str = "social_support.db";

/// Default Redis URL.
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default chat identity for commands issued from the terminal.
const DEFAULT_USER: &str = "trainer@localhost";

/// Social support training bot.
#[derive(Parser)]
#[command(name = "social-support")]
#[command(about = "Label Twitter search results for support triage from a chat prompt")]
#[command(version)]
#[command(
    long_about = concat!(
        "social-support pulls tweets matching a search query into a labeling queue ",
        "and hands them to trainers one at a time.\n\n",
        "Example usage:\n",
        "  social-support --config plugin.yaml chat --user alice@example.com\n",
        "  social-support --config plugin.yaml --store sqlite status"
    )
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub host: HostArgs,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Read chat lines from stdin and print the plugin's replies.
    Chat(ChatArgs),

    /// Run `train status` once.
    Status,

    /// Run `train gimme` once.
    Gimme(GimmeArgs),

    /// Validate configuration and verify the external credentials.
    Check(CheckArgs),

    /// Print the configuration template as YAML.
    Template,
}

/// Which key-value backend stands in for host persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Memory,
    Sqlite,
    Redis,
}

/// Options shared by every command that activates the plugin.
#[derive(Args, Debug)]
pub struct HostArgs {
    /// YAML file with the eight configuration keys. Falls back to environment
    /// variables of the same names.
    #[arg(short = 'c', long, global = true)]
    pub config: Option<String>,

    /// Persistence backend.
    #[arg(long, value_enum, default_value = "memory", global = true)]
    pub store: StoreBackend,

    /// SQLite database file (with `--store sqlite`).
    #[arg(long, default_value = DEFAULT_SQLITE_PATH, global = true)]
    pub sqlite_path: String,

    /// Redis URL (with `--store redis`).
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_REDIS_URL, global = true)]
    pub redis_url: String,

    /// Redis key prefix (with `--store redis`).
    #[arg(long, default_value = store::redis::DEFAULT_PREFIX, global = true)]
    pub redis_prefix: String,

    /// Tweets fetched per queue refill.
    #[arg(long, default_value_t = DEFAULT_FETCH_LIMIT, global = true)]
    pub fetch_limit: usize,

    /// Keep existing queue, assignments, scoreboard and corpus on activation.
    #[arg(long, global = true)]
    pub keep_state: bool,

    /// Print Prometheus metrics to stderr before exiting.
    #[arg(long, global = true)]
    pub print_metrics: bool,
}

/// Arguments for `social-support chat`.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Chat identity the lines are sent as.
    #[arg(short = 'u', long, default_value = DEFAULT_USER)]
    pub user: String,
}

/// Arguments for `social-support gimme`.
#[derive(Args, Debug)]
pub struct GimmeArgs {
    /// Chat identity the tweet is assigned to.
    #[arg(short = 'u', long, default_value = DEFAULT_USER)]
    pub user: String,
}

/// Arguments for `social-support check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Also run one small Twitter search.
    #[arg(long)]
    pub search: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.host.print_metrics {
        init_metrics().context("Failed to initialize metrics")?;
    }

    let result = match cli.command {
        Commands::Chat(args) => run_chat_command(&cli.host, args).await,
        Commands::Status => run_once(&cli.host, DEFAULT_USER, "!train status").await,
        Commands::Gimme(args) => run_once(&cli.host, &args.user, "!train gimme").await,
        Commands::Check(args) => run_check_command(&cli.host, args).await,
        Commands::Template => run_template_command(),
    };

    if cli.host.print_metrics {
        eprintln!("{}", export_metrics());
    }
    result
}

// ============================================================================
// Host setup
// ============================================================================

/// Reads the raw configuration map, or `None` when nothing is configured.
fn load_raw_config(host: &HostArgs) -> anyhow::Result<Option<HashMap<String, String>>> {
    if let Some(path) = &host.config {
        let raw = config::raw_from_yaml_file(path)
            .with_context(|| format!("Failed to read configuration file {path}"))?;
        return Ok(Some(raw));
    }

    let raw = config::raw_from_env();
    Ok(if raw.is_empty() { None } else { Some(raw) })
}

async fn open_store(host: &HostArgs) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match host.store {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::open(&host.sqlite_path)
                .await
                .with_context(|| format!("Failed to open SQLite store {}", host.sqlite_path))?,
        ),
        StoreBackend::Redis => Arc::new(
            RedisStore::connect(&host.redis_url, &host.redis_prefix)
                .await
                .context("Failed to connect to Redis store")?,
        ),
    };
    Ok(store)
}

fn settings(host: &HostArgs) -> PluginSettings {
    PluginSettings {
        fetch_limit: host.fetch_limit,
        reset_on_activate: !host.keep_state,
    }
}

async fn start_host(host: &HostArgs) -> anyhow::Result<PluginHost> {
    let raw = load_raw_config(host)?;
    let store = open_store(host).await?;

    let mut plugin_host = PluginHost::new();
    plugin_host
        .activate(raw.as_ref(), store, settings(host))
        .await;
    Ok(plugin_host)
}

// ============================================================================
// Command implementations
// ============================================================================

async fn run_once(host: &HostArgs, user: &str, line: &str) -> anyhow::Result<()> {
    let plugin_host = start_host(host).await?;
    if !plugin_host.is_active() {
        anyhow::bail!("SocialSupport is not active; run `social-support check` for details");
    }

    for reply in plugin_host.dispatch(user, line).await.unwrap_or_default() {
        println!("{reply}");
    }
    Ok(())
}

async fn run_chat_command(host: &HostArgs, args: ChatArgs) -> anyhow::Result<()> {
    let plugin_host = start_host(host).await?;
    if plugin_host.is_active() {
        info!(user = %args.user, "Chat session started; type /quit to leave");
    } else {
        warn!("SocialSupport is not active; chat lines will go unanswered");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        match plugin_host.dispatch(&args.user, line).await {
            Some(replies) => {
                for reply in replies {
                    println!("{reply}");
                }
            }
            None => println!("(no plugin handled this message)"),
        }
    }
    Ok(())
}

async fn run_check_command(host: &HostArgs, args: CheckArgs) -> anyhow::Result<()> {
    let config = match &host.config {
        Some(path) => SocialSupportConfig::from_yaml_file(path)
            .with_context(|| format!("Invalid configuration file {path}"))?,
        None if config::raw_from_env().is_empty() => anyhow::bail!(
            "No configuration found; pass --config or set {}",
            REQUIRED_KEYS.join(", ")
        ),
        None => SocialSupportConfig::from_env().context("Invalid configuration in environment")?,
    };
    println!("Configuration: ok");

    let zendesk = ZendeskClient::from_config(&config)?;
    let user = zendesk
        .verify_credentials()
        .await
        .context("Zendesk credential check failed")?;
    println!(
        "Zendesk: authenticated as {}",
        user.email.or(user.name).unwrap_or_else(|| "unknown user".to_string())
    );

    if args.search {
        let client = TwitterSearchClient::from_config(&config);
        let tweets = client
            .fetch_tweets(5)
            .await
            .context("Twitter search failed")?;
        println!(
            "Twitter: {} tweets for '{}' (last id {:?})",
            tweets.len(),
            client.query(),
            client.since_id()
        );
    }
    Ok(())
}

fn run_template_command() -> anyhow::Result<()> {
    let template: BTreeMap<&str, &str> = SocialSupportConfig::template().into_iter().collect();
    print!("{}", serde_yaml::to_string(&template)?);
    Ok(())
}
