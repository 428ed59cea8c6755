//! CLI command definitions, routing, and tracing setup.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use releasebot_core::pipeline::{self, ProgressReporter};
use releasebot_core::report::{EntryOutcome, EntryReport, RunReport};
use releasebot_ledger::Ledger;
use releasebot_publisher::{RedditClient, RedditPublisher};
use releasebot_shared::{AppConfig, DEFAULT_CONFIG_FILE, init_config, load_config_from};
use tracing::info;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// releasebot: post new Ryzom release notes to Reddit.
#[derive(Parser)]
#[command(
    name = "releasebot",
    version,
    about = "Post new Ryzom release notes to a subreddit.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true, env = "RELEASEBOT_CONFIG")]
    pub config: PathBuf,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Debug, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Publish every release note not yet in the ledger.
    Run,

    /// Fetch and render the current entries without logging in or posting.
    Preview {
        /// Print entries and rendered bodies as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Debug, PartialEq, Eq, Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config template with empty credentials.
    Init,
    /// Show the loaded configuration with secrets masked.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Local wall-clock timestamps in the given `chrono` format.
struct ChronoTimer(&'static str);

impl FormatTime for ChronoTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(self.0))
    }
}

fn filter_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "releasebot=info",
        1 => "releasebot=debug",
        _ => "releasebot=trace",
    }
}

/// Initialize tracing based on CLI flags. When `log_file` is given, events are
/// also appended to it as plain text.
pub(crate) fn init_tracing(cli: &Cli, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(cli.verbose)));

    let console = match cli.log_format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(ChronoTimer("%H:%M:%S"))
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let file_layer = match log_file {
        Some(path) => {
            let file: File = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(ChronoTimer("%Y-%m-%d %H:%M:%S")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None | Some(Command::Run) => cmd_run(&cli).await,
        Some(Command::Preview { json }) => cmd_preview(&cli, *json).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(&cli),
            ConfigAction::Show => cmd_config_show(&cli),
        },
    }
}

/// Load and validate the config for a posting run. A missing file is replaced
/// by a template and the run aborts.
fn load_run_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        init_config(path)?;
        return Err(eyre!(
            "no config found, wrote a template to {}; fill in the [reddit] section and run again",
            path.display()
        ));
    }

    let mut config = load_config_from(path)?;
    config.validate()?;
    Ok(config)
}

/// Log file from config, `None` when logging to a file is switched off.
fn log_file(config: &AppConfig) -> Option<&Path> {
    let file = config.logging.file.trim();
    (!file.is_empty()).then(|| Path::new(file))
}

async fn cmd_run(cli: &Cli) -> Result<()> {
    let config = load_run_config(&cli.config)?;
    init_tracing(cli, log_file(&config))?;

    info!(
        config = %cli.config.display(),
        subreddit = %config.reddit.subreddit,
        source = %config.source.url,
        "starting release notes run"
    );

    let mut ledger = Ledger::open(&config.ledger.path)?;
    let client = RedditClient::login(&config.reddit)
        .await
        .wrap_err("Reddit login failed")?;
    let publisher = RedditPublisher::new(client, config.reddit.subreddit.clone());

    let reporter = CliProgress::new();
    let report = pipeline::run(&config.source, &mut ledger, &publisher, &reporter)
        .await
        .wrap_err("could not read the release notes page")?;

    report.log();
    print_summary(&report);

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Entries: {}", report.entries.len());
    println!("  Posted:  {}", report.posted());
    println!("  Skipped: {}", report.skipped());
    println!("  Failed:  {}", report.failed());
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
    for entry in &report.entries {
        if let EntryOutcome::Failed { reason } = &entry.outcome {
            println!("    ✗ {} ({}): {reason}", entry.title, entry.url);
        }
    }
    println!();
}

async fn cmd_preview(cli: &Cli, json: bool) -> Result<()> {
    // Credentials are not needed here, so a missing file means defaults.
    let config = if cli.config.exists() {
        load_config_from(&cli.config)?
    } else {
        AppConfig::default()
    };
    init_tracing(cli, None)?;

    let entries = pipeline::oldest_first(pipeline::fetch_entries(&config.source).await?);

    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "key": entry.key().0,
                    "title": entry.post_title(),
                    "entry": entry,
                    "body": releasebot_markdown::render(entry),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for entry in &entries {
        println!("=== {} [{}] ===", entry.post_title(), entry.key());
        println!("{}", releasebot_markdown::render(entry));
    }
    println!("{} entries", entries.len());

    Ok(())
}

fn cmd_config_init(cli: &Cli) -> Result<()> {
    init_tracing(cli, None)?;
    init_config(&cli.config)?;
    println!("Config initialized at: {}", cli.config.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    init_tracing(cli, None)?;
    let config = load_config_from(&cli.config)?;
    let toml_str = toml::to_string_pretty(&config.masked())?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn entry_done(&self, entry: &EntryReport, current: usize, total: usize) {
        let status = match entry.outcome {
            EntryOutcome::Posted { .. } => "posted",
            EntryOutcome::Skipped => "skipped",
            EntryOutcome::Failed { .. } => "failed",
        };
        self.spinner
            .set_message(format!("[{current}/{total}] {status}: {}", entry.title));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
