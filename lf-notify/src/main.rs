//! lf-notify - Send a one-off Telegram message

use clap::Parser;
use liblikefollow::config::TelegramCredentials;
use liblikefollow::notify::telegram::{TelegramNotifier, DEFAULT_API_BASE};
use liblikefollow::notify::Notifier;
use liblikefollow::Result;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lf-notify")]
#[command(version)]
#[command(about = "Send a one-off Telegram message", long_about = None)]
struct Cli {
    /// Message text
    #[arg(env = "MESSAGE", default_value = "Default message")]
    message: String,

    /// Bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Destination chat ID (group chats are negative)
    #[arg(long, env = "TELEGRAM_CHAT_ID", allow_hyphen_values = true)]
    chat_id: Option<String>,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_BASE", default_value = DEFAULT_API_BASE, hide = true)]
    api_base: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads its env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    liblikefollow::logging::init_default(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = TelegramCredentials::from_options(cli.token, cli.chat_id)?;
    let notifier = TelegramNotifier::new(credentials)?.with_base_url(cli.api_base);

    notifier.send_text(&cli.message).await?;
    info!("Message delivered to chat {}", notifier.chat_id());
    Ok(())
}
