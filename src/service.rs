//! Telegram service implementation
//!
//! Connects to Telegram, routes incoming messages through the runtime's
//! registered actions and delivers action responses back to the chat.

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, PollType as TgPollType};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::actions::HandlerCallback;
use crate::config::TelegramConfig;
use crate::error::{Result, TelegramError};
use crate::runtime::{process_message, AgentRuntime};
use crate::types::{Content, Memory, PollSpec, PollType, TELEGRAM_SOURCE};

/// Maximum message length for Telegram
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram service state
#[derive(Default)]
struct ServiceState {
    is_running: bool,
    bot_username: Option<String>,
    dispatcher: Option<JoinHandle<()>>,
}

/// Telegram service for elizaOS
///
/// Owns the bot connection; message handling is delegated to the actions
/// registered with the agent runtime.
pub struct TelegramService {
    config: TelegramConfig,
    runtime: Arc<dyn AgentRuntime>,
    state: Arc<RwLock<ServiceState>>,
    bot: Option<Bot>,
}

impl TelegramService {
    /// Create a new Telegram service
    pub fn new(config: TelegramConfig, runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            config,
            runtime,
            state: Arc::new(RwLock::new(ServiceState::default())),
            bot: None,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Check if the service is running
    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running
    }

    /// Get bot username
    pub async fn bot_username(&self) -> Option<String> {
        self.state.read().await.bot_username.clone()
    }

    /// Start the Telegram service
    pub async fn start(&mut self) -> Result<()> {
        if self.state.read().await.is_running {
            return Err(TelegramError::AlreadyRunning);
        }

        self.config.validate()?;

        info!("Starting Telegram service...");

        let bot = build_bot(&self.config)?;

        let me = bot
            .get_me()
            .await
            .map_err(|e| TelegramError::ConnectionFailed(e.to_string()))?;

        let bot_username = me
            .username
            .clone()
            .or_else(|| self.config.bot_username.clone());

        self.bot = Some(bot.clone());

        let runtime = Arc::clone(&self.runtime);
        let config = self.config.clone();
        let dispatcher = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(
                |bot: Bot, msg: Message, runtime: Arc<dyn AgentRuntime>, config: TelegramConfig| async move {
                    handle_message(bot, msg, runtime, config).await
                },
            );

            Dispatcher::builder(bot, handler)
                .dependencies(dptree::deps![runtime, config])
                .enable_ctrlc_handler()
                .build()
                .dispatch()
                .await;
        });

        {
            let mut state = self.state.write().await;
            state.is_running = true;
            state.bot_username = bot_username.clone();
            state.dispatcher = Some(dispatcher);
        }

        info!(bot_username = ?bot_username, "Telegram service started successfully");
        Ok(())
    }

    /// Stop the Telegram service
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping Telegram service...");

        self.bot = None;

        {
            let mut state = self.state.write().await;
            state.is_running = false;
            if let Some(dispatcher) = state.dispatcher.take() {
                dispatcher.abort();
            }
        }

        info!("Telegram service stopped");
        Ok(())
    }

    /// Deliver an action response to Telegram.
    pub async fn deliver(&self, content: Content) -> Result<()> {
        let bot = self.bot.as_ref().ok_or(TelegramError::ClientNotInitialized)?;
        deliver_content(bot, content).await
    }
}

/// Builds the runtime's view of an incoming Telegram message.
pub fn message_to_memory(chat_id: i64, user_id: Option<i64>, text: Option<String>) -> Memory {
    let room_id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("telegram-chat-{}", chat_id).as_bytes(),
    );
    let entity_id = match user_id {
        Some(id) => Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("telegram-user-{}", id).as_bytes()),
        None => Uuid::new_v4(),
    };

    Memory::new(
        entity_id,
        room_id,
        Content {
            text,
            source: Some(TELEGRAM_SOURCE.to_string()),
            chat_id: Some(chat_id),
            ..Default::default()
        },
    )
}

/// Handle incoming message
async fn handle_message(
    bot: Bot,
    msg: Message,
    runtime: Arc<dyn AgentRuntime>,
    config: TelegramConfig,
) -> ResponseResult<()> {
    if let Some(user) = msg.from.as_ref() {
        if user.is_bot && config.should_ignore_bot_messages {
            debug!("Ignoring bot message from {:?}", user.username);
            return Ok(());
        }
    }

    if !config.is_chat_allowed(msg.chat.id.0) {
        debug!("Ignoring message from non-allowed chat {}", msg.chat.id.0);
        return Ok(());
    }

    let memory = message_to_memory(
        msg.chat.id.0,
        msg.from.as_ref().map(|u| u.id.0 as i64),
        msg.text().map(|s| s.to_string()),
    );

    let callback: HandlerCallback = Box::new(move |content: Content| {
        Box::pin(async move { deliver_content(&bot, content).await })
    });

    if let Some(action) = process_message(runtime.as_ref(), &memory, None, callback).await {
        debug!(action, chat_id = msg.chat.id.0, "Handled message");
    }

    Ok(())
}

fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let bot = Bot::new(&config.bot_token);
    let Some(api_root) = config.api_root.as_deref() else {
        return Ok(bot);
    };

    let url = reqwest::Url::parse(api_root).map_err(|e| {
        TelegramError::ConfigError(format!("TELEGRAM_API_ROOT is not a valid URL: {e}"))
    })?;
    debug!(api_root, "Using custom Bot API root");
    Ok(bot.set_api_url(url))
}

/// Sends an action response to the chat it is addressed to.
///
/// `SEND_POLL` responses become native polls; anything else is sent as text.
pub async fn deliver_content(bot: &Bot, content: Content) -> Result<()> {
    if let Some(spec) = PollSpec::from_content(&content) {
        return send_poll(bot, spec).await;
    }

    let chat_id = content
        .chat_id
        .ok_or_else(|| TelegramError::InvalidArgument("Response has no chat_id".to_string()))?;
    let text = content.text.unwrap_or_default();
    if text.is_empty() {
        return Err(TelegramError::InvalidArgument(
            "No message content provided".to_string(),
        ));
    }

    for part in split_message(&text) {
        bot.send_message(ChatId(chat_id), part)
            .await
            .map_err(|e| TelegramError::ApiError(e.to_string()))?;
    }
    Ok(())
}

async fn send_poll(bot: &Bot, spec: PollSpec) -> Result<()> {
    let chat_id = spec
        .chat_id
        .ok_or_else(|| TelegramError::InvalidArgument("Poll has no chat_id".to_string()))?;
    let option_count = spec.options.len();
    let poll_type = match spec.poll_type {
        PollType::Regular => TgPollType::Regular,
        PollType::Quiz => TgPollType::Quiz,
    };

    let result = bot
        .send_poll(ChatId(chat_id), spec.question, spec.options)
        .is_anonymous(spec.is_anonymous)
        .type_(poll_type)
        .await;

    match result {
        Ok(_) => {
            info!(chat_id, options = option_count, "Poll sent");
            Ok(())
        }
        Err(e) => {
            let err = TelegramError::ApiError(e.to_string());
            if err.is_retryable() {
                warn!(chat_id, "Failed to send poll: {}", err);
            } else {
                error!(chat_id, "Failed to send poll: {}", err);
            }
            Err(err)
        }
    }
}

/// Split a message into chunks that fit within Telegram's limit
pub fn split_message(content: &str) -> Vec<String> {
    if content.len() <= MAX_MESSAGE_LENGTH {
        return vec![content.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        let line_with_newline = if current.is_empty() {
            line.to_string()
        } else {
            format!("\n{}", line)
        };

        if current.len() + line_with_newline.len() <= MAX_MESSAGE_LENGTH {
            current.push_str(&line_with_newline);
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }

        if line.len() <= MAX_MESSAGE_LENGTH {
            current = line.to_string();
            continue;
        }

        for word in line.split_whitespace() {
            let word_with_space = if current.is_empty() {
                word.to_string()
            } else {
                format!(" {}", word)
            };

            if current.len() + word_with_space.len() <= MAX_MESSAGE_LENGTH {
                current.push_str(&word_with_space);
                continue;
            }

            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }

            if word.len() > MAX_MESSAGE_LENGTH {
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(MAX_MESSAGE_LENGTH) {
                    parts.push(chunk.iter().collect());
                }
            } else {
                current = word.to_string();
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::InMemoryRuntime;

    #[test]
    fn test_split_message_short() {
        let msg = "Failed to create poll: Poll must have a question and between 2-10 options.";
        let parts = split_message(msg);
        assert_eq!(parts, vec![msg.to_string()]);
    }

    #[test]
    fn test_split_message_long() {
        let msg = "a".repeat(MAX_MESSAGE_LENGTH + 500);
        let parts = split_message(&msg);
        assert!(parts.len() > 1);
        for part in &parts {
            assert!(part.len() <= MAX_MESSAGE_LENGTH);
        }
    }

    #[test]
    fn test_split_message_on_lines() {
        let line = "b".repeat(3000);
        let msg = format!("{line}\n{line}");
        let parts = split_message(&msg);
        assert_eq!(parts, vec![line.clone(), line]);
    }

    #[test]
    fn test_message_to_memory() {
        let memory = message_to_memory(-1001, Some(7), Some("/poll".to_string()));
        assert_eq!(memory.content.source.as_deref(), Some(TELEGRAM_SOURCE));
        assert_eq!(memory.content.chat_id, Some(-1001));
        assert_eq!(memory.content.text.as_deref(), Some("/poll"));

        let again = message_to_memory(-1001, Some(7), None);
        assert_eq!(memory.room_id, again.room_id);
        assert_eq!(memory.entity_id, again.entity_id);
        assert_ne!(memory.id, again.id);
    }

    #[tokio::test]
    async fn test_service_creation() {
        let config = TelegramConfig::new("123456:ABC-DEF".to_string());
        let service = TelegramService::new(config, Arc::new(InMemoryRuntime::new("PollBot")));
        assert_eq!(service.config().bot_token, "123456:ABC-DEF");
        assert!(!service.is_running().await);
        assert!(service.bot_username().await.is_none());
    }

    #[tokio::test]
    async fn test_build_bot_api_root() {
        let config = TelegramConfig::new("123456:ABC-DEF".to_string());
        let bot = build_bot(&config).unwrap();
        assert_eq!(bot.api_url().as_str(), "https://api.telegram.org/");

        let bot = build_bot(&config.clone().with_api_root("http://localhost:8081".to_string())).unwrap();
        assert_eq!(bot.api_url().as_str(), "http://localhost:8081/");

        let err = build_bot(&config.with_api_root("not a url".to_string())).unwrap_err();
        assert!(matches!(err, TelegramError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_deliver_requires_start() {
        let config = TelegramConfig::new("123456:ABC-DEF".to_string());
        let service = TelegramService::new(config, Arc::new(InMemoryRuntime::new("PollBot")));
        let err = service.deliver(Content::text("hi").with_chat_id(1)).await.unwrap_err();
        assert!(matches!(err, TelegramError::ClientNotInitialized));
    }
}
