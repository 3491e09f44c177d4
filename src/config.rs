use serde::{Deserialize, Serialize};

use crate::error::{Result, TelegramError};
use crate::runtime::AgentRuntime;

/// Setting holding the bot token.
pub const BOT_TOKEN_SETTING: &str = "TELEGRAM_BOT_TOKEN";

/// Configuration options for the Telegram client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token in the `123456:ABC-DEF...` format.
    pub bot_token: String,
    /// If non-empty, only messages from these chat IDs are processed.
    pub allowed_chat_ids: Vec<i64>,
    /// Whether to ignore messages sent by bots.
    pub should_ignore_bot_messages: bool,
    /// Optional bot username (without the `@`).
    pub bot_username: Option<String>,
    /// Optional Bot API root URL (defaults to `https://api.telegram.org`).
    pub api_root: Option<String>,
}

/// Raw setting values, however they were looked up.
#[derive(Debug, Default)]
struct RawSettings {
    bot_token: Option<String>,
    allowed_chats: Option<String>,
    ignore_bot_messages: Option<String>,
    bot_username: Option<String>,
    api_root: Option<String>,
}

impl TelegramConfig {
    /// Creates a new config with sensible defaults.
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            allowed_chat_ids: Vec::new(),
            should_ignore_bot_messages: true,
            bot_username: None,
            api_root: None,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Required:
    /// - `TELEGRAM_BOT_TOKEN`
    ///
    /// Optional:
    /// - `TELEGRAM_ALLOWED_CHATS` (JSON array of `i64` chat IDs)
    /// - `TELEGRAM_SHOULD_IGNORE_BOT_MESSAGES` (`true`/`false`)
    /// - `TELEGRAM_BOT_USERNAME`
    /// - `TELEGRAM_API_ROOT`
    pub fn from_env() -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        Self::from_raw(RawSettings {
            bot_token: env(BOT_TOKEN_SETTING),
            allowed_chats: env("TELEGRAM_ALLOWED_CHATS"),
            ignore_bot_messages: env("TELEGRAM_SHOULD_IGNORE_BOT_MESSAGES"),
            bot_username: env("TELEGRAM_BOT_USERNAME"),
            api_root: env("TELEGRAM_API_ROOT"),
        })
    }

    /// Loads configuration from the agent runtime's settings.
    ///
    /// Uses the same keys as [`TelegramConfig::from_env`].
    pub async fn from_runtime(runtime: &dyn AgentRuntime) -> Result<Self> {
        Self::from_raw(RawSettings {
            bot_token: runtime.get_setting(BOT_TOKEN_SETTING).await,
            allowed_chats: runtime.get_setting("TELEGRAM_ALLOWED_CHATS").await,
            ignore_bot_messages: runtime
                .get_setting("TELEGRAM_SHOULD_IGNORE_BOT_MESSAGES")
                .await,
            bot_username: runtime.get_setting("TELEGRAM_BOT_USERNAME").await,
            api_root: runtime.get_setting("TELEGRAM_API_ROOT").await,
        })
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let bot_token = raw
            .bot_token
            .ok_or_else(|| TelegramError::MissingSetting(BOT_TOKEN_SETTING.to_string()))?;

        if bot_token.is_empty() {
            return Err(TelegramError::ConfigError(
                "TELEGRAM_BOT_TOKEN cannot be empty".to_string(),
            ));
        }

        let allowed_chat_ids = match raw.allowed_chats {
            Some(s) => serde_json::from_str(&s).map_err(|e| {
                TelegramError::ConfigError(format!("TELEGRAM_ALLOWED_CHATS is not a JSON array: {e}"))
            })?,
            None => Vec::new(),
        };

        let should_ignore_bot_messages = raw
            .ignore_bot_messages
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(true);

        Ok(Self {
            bot_token,
            allowed_chat_ids,
            should_ignore_bot_messages,
            bot_username: raw.bot_username,
            api_root: raw.api_root,
        })
    }

    /// Sets the allowed chat IDs list (empty list means "allow all").
    pub fn with_allowed_chat_ids(mut self, ids: Vec<i64>) -> Self {
        self.allowed_chat_ids = ids;
        self
    }

    /// Sets whether bot messages should be ignored.
    pub fn with_ignore_bot_messages(mut self, ignore: bool) -> Self {
        self.should_ignore_bot_messages = ignore;
        self
    }

    /// Sets the bot username (without the `@`).
    pub fn with_bot_username(mut self, username: String) -> Self {
        self.bot_username = Some(username);
        self
    }

    /// Sets a custom Bot API root URL.
    pub fn with_api_root(mut self, url: String) -> Self {
        self.api_root = Some(url);
        self
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(TelegramError::ConfigError(
                "Bot token cannot be empty".to_string(),
            ));
        }

        if !self.bot_token.contains(':') {
            return Err(TelegramError::ConfigError(
                "Bot token format is invalid (should contain ':')".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns `true` if the given chat ID is allowed by the configuration.
    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }
}
