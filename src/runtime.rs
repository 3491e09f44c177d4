//! Agent runtime seam
//!
//! The client does not own the agent runtime. Everything it needs from one is
//! captured by [`AgentRuntime`]: a place to register actions, a way to compose
//! conversational state and a settings lookup. [`InMemoryRuntime`] is a small
//! self-contained implementation used by the bundled binary and by tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::actions::{HandlerCallback, TelegramAction};
use crate::error::{Result, TelegramError};
use crate::types::{Memory, State};

/// Operations the client consumes from the host agent runtime.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Name of the character the runtime is running.
    fn character_name(&self) -> String;

    /// Makes an action reachable for future messages.
    fn register_action(&self, action: Arc<dyn TelegramAction>) -> Result<()>;

    /// Registered actions, in registration order.
    fn actions(&self) -> Vec<Arc<dyn TelegramAction>>;

    /// Composes conversational state for a message.
    async fn compose_state(&self, message: &Memory) -> Result<State>;

    /// Looks up a runtime setting.
    async fn get_setting(&self, key: &str) -> Option<String>;
}

/// Ordered, name-unique collection of actions.
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<Vec<Arc<dyn TelegramAction>>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action, rejecting duplicate names.
    pub fn register(&self, action: Arc<dyn TelegramAction>) -> Result<()> {
        let mut actions = self.actions.write().unwrap_or_else(PoisonError::into_inner);
        if actions.iter().any(|a| a.name() == action.name()) {
            return Err(TelegramError::DuplicateAction(action.name().to_string()));
        }
        info!(action = action.name(), "Registered action");
        actions.push(action);
        Ok(())
    }

    /// Looks up an action by exact name.
    pub fn find(&self, name: &str) -> Option<Arc<dyn TelegramAction>> {
        self.read().iter().find(|a| a.name() == name).cloned()
    }

    /// Looks up an action by name or simile, ignoring case.
    pub fn find_by_simile(&self, name: &str) -> Option<Arc<dyn TelegramAction>> {
        self.read()
            .iter()
            .find(|a| {
                a.name().eq_ignore_ascii_case(name)
                    || a.similes().iter().any(|s| s.eq_ignore_ascii_case(name))
            })
            .cloned()
    }

    /// Names of all registered actions.
    pub fn names(&self) -> Vec<&'static str> {
        self.read().iter().map(|a| a.name()).collect()
    }

    /// All registered actions, in registration order.
    pub fn all(&self) -> Vec<Arc<dyn TelegramAction>> {
        self.read().clone()
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn TelegramAction>>> {
        self.actions.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Self-contained runtime backed by an [`ActionRegistry`] and a settings map.
pub struct InMemoryRuntime {
    character_name: String,
    registry: ActionRegistry,
    settings: HashMap<String, String>,
}

impl InMemoryRuntime {
    /// Creates a runtime for the given character with no settings.
    pub fn new(character_name: impl Into<String>) -> Self {
        Self {
            character_name: character_name.into(),
            registry: ActionRegistry::new(),
            settings: HashMap::new(),
        }
    }

    /// Adds a setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Adds every `TELEGRAM_*` variable from the process environment.
    pub fn with_env_settings(mut self) -> Self {
        for (key, value) in std::env::vars() {
            if key.starts_with("TELEGRAM_") {
                self.settings.insert(key, value);
            }
        }
        self
    }

    /// The underlying action registry.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }
}

#[async_trait]
impl AgentRuntime for InMemoryRuntime {
    fn character_name(&self) -> String {
        self.character_name.clone()
    }

    fn register_action(&self, action: Arc<dyn TelegramAction>) -> Result<()> {
        self.registry.register(action)
    }

    fn actions(&self) -> Vec<Arc<dyn TelegramAction>> {
        self.registry.all()
    }

    async fn compose_state(&self, message: &Memory) -> Result<State> {
        let content = &message.content;
        let mut state = State {
            text: content.text.clone().unwrap_or_default(),
            ..Default::default()
        }
        .with_value("agentName", self.character_name.clone())
        .with_value("roomId", message.room_id.to_string());

        if let Some(source) = &content.source {
            state = state.with_value("source", source.clone());
        }
        if let Some(chat_id) = content.chat_id {
            state = state.with_value("chatId", chat_id);
        }
        Ok(state)
    }

    async fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }
}

/// Routes a message to the first registered action that accepts it.
///
/// Returns the name of the action whose handler ran, or `None` when no
/// action applies (the callback is then dropped unused).
pub async fn process_message(
    runtime: &dyn AgentRuntime,
    message: &Memory,
    state: Option<State>,
    callback: HandlerCallback,
) -> Option<&'static str> {
    for action in runtime.actions() {
        if action.validate(runtime, message, state.as_ref()).await {
            debug!(action = action.name(), message_id = %message.id, "Action matched");
            action.handler(runtime, message, state, None, callback).await;
            return Some(action.name());
        }
    }
    debug!(message_id = %message.id, "No action matched");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::CreatePollAction;
    use crate::types::Content;
    use futures::future::BoxFuture;

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let registry = ActionRegistry::new();
        registry.register(Arc::new(CreatePollAction)).unwrap();

        let err = registry.register(Arc::new(CreatePollAction)).unwrap_err();
        assert!(matches!(err, TelegramError::DuplicateAction(ref name) if name == "CREATE_POLL"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ActionRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(CreatePollAction)).unwrap();

        assert!(registry.find("CREATE_POLL").is_some());
        assert!(registry.find("START_POLL").is_none());
        assert!(registry.find_by_simile("start_poll").is_some());
        assert!(registry.find_by_simile("telegram_poll").is_some());
        assert!(registry.find_by_simile("SEND_MESSAGE").is_none());
        assert_eq!(registry.names(), vec!["CREATE_POLL"]);
    }

    #[tokio::test]
    async fn test_in_memory_compose_state() {
        let runtime = InMemoryRuntime::new("PollBot");
        let message = Memory::from_content(
            Content::text("/poll").with_source("telegram").with_chat_id(-42),
        );

        let state = runtime.compose_state(&message).await.unwrap();
        assert_eq!(state.text, "/poll");
        assert_eq!(state.values["agentName"], "PollBot");
        assert_eq!(state.values["source"], "telegram");
        assert_eq!(state.values["chatId"], -42);
    }

    #[tokio::test]
    async fn test_in_memory_settings() {
        let runtime = InMemoryRuntime::new("PollBot").with_setting("TELEGRAM_BOT_TOKEN", "1:a");
        assert_eq!(runtime.get_setting("TELEGRAM_BOT_TOKEN").await.as_deref(), Some("1:a"));
        assert!(runtime.get_setting("MISSING").await.is_none());
        assert_eq!(runtime.character_name(), "PollBot");
    }

    #[tokio::test]
    async fn test_process_message_without_match() {
        let runtime = InMemoryRuntime::new("PollBot");
        runtime.register_action(Arc::new(CreatePollAction)).unwrap();

        let message = Memory::from_content(Content::text("hello").with_source("telegram"));
        let callback: HandlerCallback =
            Box::new(|_| -> BoxFuture<'static, Result<()>> { panic!("callback must not run") });

        assert_eq!(process_message(&runtime, &message, None, callback).await, None);
    }
}
