//! Telegram actions module
//!
//! An action pairs a cheap recognition predicate (`validate`) with an
//! execution routine (`handler`) that reports its single result through a
//! [`HandlerCallback`].

mod create_poll;

pub use create_poll::{parse_poll, CreatePollAction, ParsedPoll, MAX_POLL_OPTIONS, MIN_POLL_OPTIONS};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::runtime::AgentRuntime;
use crate::types::{ActionExample, Content, Memory, State};

/// Receives the one response an action handler produces.
///
/// Being `FnOnce`, a callback can be invoked at most once; handlers invoke it
/// on every code path.
pub type HandlerCallback = Box<dyn FnOnce(Content) -> BoxFuture<'static, Result<()>> + Send>;

/// Trait for Telegram actions
#[async_trait]
pub trait TelegramAction: Send + Sync {
    /// Unique action name
    fn name(&self) -> &'static str;

    /// Alternate names for fuzzy matching
    fn similes(&self) -> Vec<&'static str>;

    /// Get action description
    fn description(&self) -> &'static str;

    /// Illustrative conversations, used for documentation and prompting
    fn examples(&self) -> Vec<Vec<ActionExample>>;

    /// Returns `true` if this action should handle the message.
    ///
    /// Must be free of side effects.
    async fn validate(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<&State>,
    ) -> bool;

    /// Executes the action, invoking `callback` exactly once.
    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
        options: Option<&Value>,
        callback: HandlerCallback,
    );
}

/// Get all built-in actions
pub fn get_all_actions() -> Vec<Arc<dyn TelegramAction>> {
    vec![Arc::new(CreatePollAction)]
}
