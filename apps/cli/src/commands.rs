//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use solonews_core::{ProgressReporter, run_collection};
use solonews_shared::{
    AppConfig, CollectConfig, CollectionSummary, init_config, load_config, load_config_from,
};
use serde::Serialize;
use solonews_storage::{Storage, StoredArticle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// solonews — collect 나는 솔로 news from search result pages.
#[derive(Parser)]
#[command(
    name = "solonews",
    version,
    about = "Collect topic news from search result pages into a local article store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.solonews/solonews.toml.
    #[arg(long, global = true, env = "SOLONEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Run one collection and print the JSON summary.
    Collect {
        /// Maximum articles to collect (clamped to 1..=100).
        #[arg(long, allow_negative_numbers = true)]
        max_items: Option<i64>,

        /// Database path (overrides storage.db_path).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print stored articles, newest first, as JSON.
    List {
        /// Number of articles to print (clamped to 1..=100).
        #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
        limit: i64,

        /// Number of articles to skip.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,

        /// Database path (overrides storage.db_path).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print one stored article, looked up by content hash, as JSON.
    Show {
        /// 64-character SHA-256 fingerprint.
        hash: String,

        /// Database path (overrides storage.db_path).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create a default config file.
    Init,
    /// Show the current configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "solonews=info",
        1 => "solonews=debug",
        _ => "solonews=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Collect { max_items, db } => {
            cmd_collect(config_path, max_items, db.as_deref()).await
        }
        Command::List { limit, offset, db } => {
            cmd_list(config_path, limit, offset, db.as_deref()).await
        }
        Command::Show { hash, db } => cmd_show(config_path, &hash, db.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn db_path(config: &AppConfig, flag: Option<&Path>) -> Result<PathBuf> {
    match flag {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(config.storage.resolved_db_path()?),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_collect(
    config_path: Option<&Path>,
    max_items: Option<i64>,
    db: Option<&Path>,
) -> Result<()> {
    let config = app_config(config_path)?;
    let max_items = config.collection.budget(max_items);
    let db_path = db_path(&config, db)?;

    info!(max_items, db = %db_path.display(), "collecting articles");

    let storage = Storage::open(&db_path)
        .await
        .wrap_err_with(|| format!("cannot open article store at {}", db_path.display()))?;

    let reporter = CliProgress::new()?;
    let summary = run_collection(CollectConfig::from(&config), max_items, &storage, &reporter).await;
    reporter.clear();
    let summary = summary?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_list(
    config_path: Option<&Path>,
    limit: i64,
    offset: i64,
    db: Option<&Path>,
) -> Result<()> {
    let config = app_config(config_path)?;
    let db_path = db_path(&config, db)?;

    let storage = Storage::open_readonly(&db_path).await?;
    let page = ArticlePage {
        total: storage.count_articles().await?,
        offset: offset.max(0),
        articles: storage.list_articles(limit, offset).await?,
    };
    info!(count = page.articles.len(), total = page.total, "listing articles");

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

async fn cmd_show(config_path: Option<&Path>, hash: &str, db: Option<&Path>) -> Result<()> {
    let config = app_config(config_path)?;
    let db_path = db_path(&config, db)?;

    let storage = Storage::open_readonly(&db_path).await?;
    match storage.get_article_by_hash(hash).await? {
        Some(article) => {
            println!("{}", serde_json::to_string_pretty(&article)?);
            Ok(())
        }
        None => Err(eyre!("no stored article with hash {hash}")),
    }
}

/// `list` output: one page of articles plus the store total.
#[derive(Serialize)]
struct ArticlePage {
    total: u64,
    offset: i64,
    articles: Vec<StoredArticle>,
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }

    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_done(&self, page: usize, total_pages: usize, found: usize) {
        self.spinner
            .set_message(format!("Fetched page [{page}/{total_pages}], {found} new"));
    }

    fn done(&self, _summary: &CollectionSummary) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use solonews_shared::CollectionRequest;

    use super::*;

    #[test]
    fn parses_collect_flags() {
        let cli = Cli::try_parse_from([
            "solonews",
            "collect",
            "--max-items",
            "5",
            "--db",
            "/tmp/a.db",
        ])
        .unwrap();
        match cli.command {
            Command::Collect { max_items, db } => {
                assert_eq!(max_items, Some(5));
                assert_eq!(db.as_deref(), Some(Path::new("/tmp/a.db")));
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn list_defaults_and_global_flags() {
        let cli = Cli::try_parse_from(["solonews", "list", "-vv", "--log-format", "json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        match cli.command {
            Command::List { limit, offset, db } => {
                assert_eq!((limit, offset), (20, 0));
                assert!(db.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn negative_max_items_is_accepted_and_clamped_later() {
        let cli = Cli::try_parse_from(["solonews", "collect", "--max-items", "-3"]).unwrap();
        let Command::Collect { max_items, .. } = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(CollectionRequest { max_items }.max_items(), 1);
    }

    #[test]
    fn show_takes_a_hash() {
        let cli = Cli::try_parse_from(["solonews", "show", "abc123"]).unwrap();
        let Command::Show { hash, db } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(hash, "abc123");
        assert!(db.is_none());
    }

    #[test]
    fn config_budget_is_overridden_by_flag() {
        let mut config = AppConfig::default();
        config.collection.max_items = 500;
        let cli = Cli::try_parse_from(["solonews", "collect", "--max-items", "5"]).unwrap();
        let Command::Collect { max_items, .. } = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(config.collection.budget(max_items), 5);
        assert_eq!(config.collection.budget(None), 100);
    }

    #[test]
    fn db_flag_overrides_config() {
        let config = AppConfig::default();
        let path = db_path(&config, Some(Path::new("/tmp/override.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/override.db"));
    }
}
