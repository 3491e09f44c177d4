//! Create poll action
//!
//! Recognises `/poll` and `/createpoll` commands of the form
//!
//! ```text
//! /poll
//! Your question
//! Option 1
//! Option 2
//! [Option 3...]
//! ```
//!
//! and answers with a `SEND_POLL` response describing the poll, or a
//! `CREATE_POLL_ERROR` response explaining why the command was rejected.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, error, warn};

use super::{HandlerCallback, TelegramAction};
use crate::error::{PollError, Result, TelegramError};
use crate::runtime::AgentRuntime;
use crate::types::{
    ActionExample, Content, Memory, PollSpec, PollType, State, CREATE_POLL_ERROR, SEND_POLL,
};

/// Fewest options a poll may have.
pub const MIN_POLL_OPTIONS: usize = 2;
/// Most options a poll may have.
pub const MAX_POLL_OPTIONS: usize = 10;

/// `/poll` or `/createpoll` at the start of the text. The boundary is ASCII-only,
/// so a non-ASCII letter right after the command still counts as a break.
static COMMAND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^/(?:create)?poll(?-u:\b)").unwrap());

/// Question and options extracted from a poll command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPoll {
    /// Trimmed question line.
    pub question: String,
    /// Trimmed option lines, in the order given.
    pub options: Vec<String>,
}

/// Parses the text of a poll command.
///
/// The first line is the command and is ignored. Blank option lines are kept,
/// so they are rejected as empty options rather than skipped.
pub fn parse_poll(text: &str) -> std::result::Result<ParsedPoll, PollError> {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 3 {
        return Err(PollError::InvalidFormat);
    }

    let question = lines[1].trim().to_string();
    let options: Vec<String> = lines[2..].iter().map(|l| l.trim().to_string()).collect();

    if question.is_empty()
        || !(MIN_POLL_OPTIONS..=MAX_POLL_OPTIONS).contains(&options.len())
        || options.iter().any(String::is_empty)
    {
        return Err(PollError::InvalidContent);
    }

    Ok(ParsedPoll { question, options })
}

/// Action that turns a poll command into a poll description for delivery.
pub struct CreatePollAction;

impl CreatePollAction {
    async fn build_response(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
    ) -> Result<Content> {
        let state = match state {
            Some(state) => state,
            None => runtime.compose_state(message).await?,
        };
        debug!(values = state.values.len(), "Creating poll");

        let content = &message.content;
        let parsed = parse_poll(content.text.as_deref().unwrap_or_default())?;

        let spec = PollSpec {
            chat_id: content.chat_id,
            question: parsed.question,
            options: parsed.options,
            is_anonymous: true,
            poll_type: PollType::Regular,
        };

        Ok(Content {
            text: Some(spec.question.clone()),
            source: content.source.clone(),
            action: Some(SEND_POLL.to_string()),
            chat_id: content.chat_id,
            metadata: Some(serde_json::to_value(&spec)?),
        })
    }

    fn error_response(message: &Memory, err: &TelegramError) -> Content {
        let content = &message.content;
        Content {
            text: Some(format!("Failed to create poll: {}", err)),
            source: content.source.clone(),
            action: Some(CREATE_POLL_ERROR.to_string()),
            chat_id: content.chat_id,
            metadata: Some(serde_json::json!({ "chat_id": content.chat_id })),
        }
    }
}

#[async_trait]
impl TelegramAction for CreatePollAction {
    fn name(&self) -> &'static str {
        "CREATE_POLL"
    }

    fn similes(&self) -> Vec<&'static str> {
        vec!["START_POLL", "INITIATE_VOTE", "TELEGRAM_POLL"]
    }

    fn description(&self) -> &'static str {
        "Creates a poll in a Telegram chat with the provided question and options."
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        let conversation = |command: &str, reply: &str| {
            vec![
                ActionExample::new("{{user1}}", Content::text(command)),
                ActionExample::new("{{user2}}", Content::text(reply).with_action(self.name())),
            ]
        };
        vec![
            conversation(
                "/poll\nWhat is your favorite color?\nRed\nBlue\nGreen",
                "Creating a poll:\n\n*What is your favorite color?*\n1. Red\n2. Blue\n3. Green",
            ),
            conversation(
                "/poll\nWhich programming language do you prefer?\nJavaScript\nPython\nC++",
                "Creating a poll:\n\n*Which programming language do you prefer?*\n1. JavaScript\n2. Python\n3. C++",
            ),
        ]
    }

    async fn validate(
        &self,
        _runtime: &dyn AgentRuntime,
        message: &Memory,
        _state: Option<&State>,
    ) -> bool {
        let content = &message.content;
        if !content.is_from_telegram() {
            return false;
        }
        content
            .text
            .as_deref()
            .is_some_and(|text| COMMAND_PATTERN.is_match(text))
    }

    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
        _options: Option<&Value>,
        callback: HandlerCallback,
    ) {
        let response = match self.build_response(runtime, message, state).await {
            Ok(response) => response,
            Err(err) => {
                match err {
                    TelegramError::InvalidPoll(ref reason) => {
                        debug!(chat_id = ?message.content.chat_id, "Rejected poll command: {}", reason)
                    }
                    ref other => error!("Error creating poll: {}", other),
                }
                Self::error_response(message, &err)
            }
        };

        if let Err(e) = callback(response).await {
            warn!("Failed to deliver poll response: {}", e);
        }
    }
}
