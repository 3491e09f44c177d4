//! Telegram poll agent
//!
//! Runs the Telegram client against an in-memory runtime so `/poll` commands
//! can be tried out without a full agent deployment.
//!
//! Required environment variables:
//! - TELEGRAM_BOT_TOKEN: Your Telegram bot token from @BotFather
//!
//! Optional:
//! - AGENT_NAME: Character name used in logs (defaults to `PollBot`)
//! - TELEGRAM_ALLOWED_CHATS, TELEGRAM_SHOULD_IGNORE_BOT_MESSAGES, TELEGRAM_BOT_USERNAME,
//!   TELEGRAM_API_ROOT

use anyhow::{Context, Result};
use elizaos_client_telegram::{InMemoryRuntime, TelegramClient};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("elizaos_client_telegram=info".parse()?)
                .add_directive("telegram_poll_agent=info".parse()?)
                .add_directive("teloxide=warn".parse()?),
        )
        .init();

    let _ = dotenvy::dotenv();

    std::env::var("TELEGRAM_BOT_TOKEN").context(
        "TELEGRAM_BOT_TOKEN environment variable is required.\n   Get your bot token from @BotFather on Telegram",
    )?;

    let character_name = std::env::var("AGENT_NAME").unwrap_or_else(|_| "PollBot".to_string());
    let runtime = Arc::new(InMemoryRuntime::new(character_name).with_env_settings());

    let mut service = TelegramClient::start(runtime)
        .await
        .context("Failed to start Telegram client")?;

    info!("Send /poll followed by a question and 2-10 options, one per line. Press Ctrl+C to stop.");

    signal::ctrl_c().await?;

    info!("Shutting down...");
    TelegramClient::stop(&mut service).await?;

    Ok(())
}
