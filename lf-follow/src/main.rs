//! lf-follow - Follow the accounts that liked your recent posts
//!
//! Runs a single pass: scans recent posts, follows new likers up to the
//! configured cap, records every decision in the state file and sends a
//! summary to Telegram.

use clap::{Parser, ValueEnum};
use liblikefollow::config::Config;
use liblikefollow::notify::telegram::TelegramNotifier;
use liblikefollow::pacing::{SleepWindow, TokioPacer};
use liblikefollow::platforms::twitter::TwitterClient;
use liblikefollow::{FollowOrchestrator, JsonFileStore, Result, RunReport};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "lf-follow")]
#[command(version)]
#[command(about = "Follow the accounts that liked your recent posts")]
#[command(long_about = "\
lf-follow - Follow the accounts that liked your recent posts

DESCRIPTION:
    lf-follow scans your most recent original posts, pages through the
    accounts that liked them and follows the ones you have not seen before.
    Protected accounts, accounts you already follow and your own account are
    skipped. Every account decided on is remembered in the state file, so
    repeated runs only ever look at new likers.

    After each follow attempt lf-follow waits a random interval. At the end
    of the run it sends \"Followed N new users\" to Telegram and prints the
    same line on stdout.

USAGE:
    # One pass with settings from the environment (or .env)
    lf-follow

    # Follow at most 5 accounts, scanning the 10 newest posts
    lf-follow --follow-cap 5 --tweets 10

    # Machine-readable run report
    lf-follow --format json

CONFIGURATION:
    Required environment:
        API_KEY, API_SECRET, ACCESS_TOKEN, ACCESS_TOKEN_SECRET,
        TELEGRAM_TOKEN, TELEGRAM_CHAT_ID

    Optional environment:
        NUM_TWEETS (20), FOLLOW_CAP (15), PAGE_LIMIT (1),
        SLEEP_MIN (2), SLEEP_MAX (4), STATE_FILE (processed_likers.json)

    Optional config file: $LIKEFOLLOW_CONFIG or ~/.config/likefollow/config.toml

    [run]
    tweets_to_scan = 20
    follow_cap = 15

EXIT CODES:
    0 - Run completed
    1 - Could not resolve the account (authentication failure)
    2 - Configuration error
")]
struct Cli {
    /// Maximum number of follows this run (overrides FOLLOW_CAP)
    #[arg(long, value_name = "N")]
    follow_cap: Option<usize>,

    /// Number of recent posts to scan (overrides NUM_TWEETS)
    #[arg(long, value_name = "N")]
    tweets: Option<usize>,

    /// Liker pages fetched per post (overrides PAGE_LIMIT)
    #[arg(long, value_name = "N")]
    pages: Option<usize>,

    /// Minimum seconds to wait after a follow attempt (overrides SLEEP_MIN)
    #[arg(long, value_name = "SECONDS")]
    sleep_min: Option<f64>,

    /// Maximum seconds to wait after a follow attempt (overrides SLEEP_MAX)
    #[arg(long, value_name = "SECONDS")]
    sleep_max: Option<f64>,

    /// Path of the processed-likers file (overrides STATE_FILE)
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Output format for the run report
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Read before logging starts so LIKEFOLLOW_LOG_* can come from the file
    let env_file = load_env_file(cli.env_file.as_deref());
    liblikefollow::logging::init_default(cli.verbose);
    match env_file {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Could not read env file: {}", e),
    }

    match run(&cli).await {
        Ok(report) => print_report(&report, cli.format),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Preload variables from an env file without overriding ones already set
///
/// A missing `./.env` is ignored; a missing explicit `--env-file` is reported.
fn load_env_file(path: Option<&Path>) -> std::result::Result<Option<PathBuf>, dotenvy::Error> {
    match path {
        Some(path) => dotenvy::from_path(path).map(|_| Some(path.to_path_buf())),
        None => Ok(dotenvy::dotenv().ok()),
    }
}

async fn run(cli: &Cli) -> Result<RunReport> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, cli)?;

    info!(
        "Scanning {} post(s), {} page(s) each, follow cap {}",
        config.run.tweets_to_scan, config.run.pages_per_post, config.run.follow_cap
    );
    info!("State file: {}", config.state_file.display());

    let platform = TwitterClient::new(config.twitter)?;
    let notifier = TelegramNotifier::new(config.telegram)?;
    let store = JsonFileStore::new(config.state_file);
    let pacer = TokioPacer;

    FollowOrchestrator::new(&platform, &notifier, &store, &pacer, config.run)
        .run()
        .await
}

/// CLI flags take precedence over every other configuration source
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(cap) = cli.follow_cap {
        config.run.follow_cap = cap;
    }
    if let Some(tweets) = cli.tweets {
        config.run.tweets_to_scan = tweets;
    }
    if let Some(pages) = cli.pages {
        config.run.pages_per_post = pages;
    }
    if cli.sleep_min.is_some() || cli.sleep_max.is_some() {
        let current = config.run.sleep;
        config.run.sleep = SleepWindow::new(
            cli.sleep_min.unwrap_or(current.min()),
            cli.sleep_max.unwrap_or(current.max()),
        )?;
    }
    if let Some(path) = &cli.state_file {
        config.state_file = liblikefollow::config::expand_path(&path.to_string_lossy());
    }
    Ok(())
}

fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", report.summary()),
        OutputFormat::Json => match serde_json::to_string(report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to encode report: {}", e);
                println!("{}", report.summary());
            }
        },
    }
}
