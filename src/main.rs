mod commands;
mod gateway;

use clap::{Parser, Subcommand};
use prorab_channels::TelegramChannel;
use prorab_core::{config, history::History, traits::Provider};
use prorab_memory::SessionStore;
use prorab_providers::YandexGptProvider;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "prorab",
    version,
    about = "Прораб — Telegram chat bot backed by Yandex GPT"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check configuration and upstream availability.
    Status,
    /// Send a one-shot prompt without starting the bot.
    Ask {
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            if cfg.telegram.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram bot_token is empty. \
                     Set it in config.toml or the TELEGRAM_KEY env var."
                );
            }

            let provider: Arc<dyn Provider> =
                Arc::new(YandexGptProvider::from_config(cfg.yandex.clone()));
            let channel = Arc::new(TelegramChannel::new(cfg.telegram.clone()));
            let sessions = SessionStore::new(cfg.history.max_messages);

            println!("Прораб — starting bot...");
            let gw = Arc::new(gateway::Gateway::new(
                provider,
                channel,
                sessions,
                cfg.schedule.clone(),
            ));
            gw.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Прораб — Status Check\n");
            println!("Config: {}", cli.config);
            println!();

            println!(
                "  telegram: {}",
                if cfg.telegram.bot_token.is_empty() {
                    "missing bot_token"
                } else {
                    "configured"
                }
            );
            println!(
                "  yandex: {}",
                if cfg.yandex.oauth_token.is_empty() {
                    "missing oauth_token"
                } else if cfg.yandex.folder_id.is_empty() {
                    "missing folder_id"
                } else {
                    "configured"
                }
            );
            println!(
                "  schedule: {}",
                if !cfg.schedule.enabled {
                    "disabled"
                } else if cfg.schedule.chat_id.is_empty() {
                    "enabled but missing chat_id"
                } else {
                    "configured"
                }
            );

            let provider = YandexGptProvider::from_config(cfg.yandex.clone());
            println!(
                "  upstream: {}",
                if provider.is_available().await {
                    "configured"
                } else {
                    "missing credentials"
                }
            );
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: prorab ask <message>");
            }

            let prompt = message.join(" ");
            let cfg = config::load(&cli.config)?;
            let provider = YandexGptProvider::from_config(cfg.yandex.clone());

            let reply = provider.complete(&History::new(1), &prompt).await?;
            println!("{reply}");
        }
    }

    Ok(())
}
