use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Platform tag carried in `Content::source` for messages received from Telegram.
pub const TELEGRAM_SOURCE: &str = "telegram";

/// Response marker for a successfully parsed poll.
pub const SEND_POLL: &str = "SEND_POLL";
/// Response marker for a rejected poll command.
pub const CREATE_POLL_ERROR: &str = "CREATE_POLL_ERROR";

/// Message content exchanged between the runtime, actions and the delivery layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Originating platform (e.g. `"telegram"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Action marker, set on responses produced by an action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Telegram chat the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Content {
    /// Creates text-only content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Sets the originating platform.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the chat identifier.
    pub fn with_chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Sets the action marker.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Returns `true` if this content came from Telegram.
    pub fn is_from_telegram(&self) -> bool {
        self.source.as_deref() == Some(TELEGRAM_SOURCE)
    }
}

/// A single incoming message as seen by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Message identifier.
    pub id: Uuid,
    /// Sender identifier.
    pub entity_id: Uuid,
    /// Conversation identifier.
    pub room_id: Uuid,
    /// Message content.
    pub content: Content,
}

impl Memory {
    /// Creates a new memory with fresh identifiers.
    pub fn new(entity_id: Uuid, room_id: Uuid, content: Content) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_id,
            room_id,
            content,
        }
    }

    /// Creates a memory with random sender and room identifiers.
    pub fn from_content(content: Content) -> Self {
        Self::new(Uuid::new_v4(), Uuid::new_v4(), content)
    }
}

/// Conversational state composed by the runtime for a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Rendered context text.
    pub text: String,
    /// Key/value pairs available to actions.
    pub values: Map<String, Value>,
}

impl State {
    /// Adds a value to the state.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// One turn in an illustrative action conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExample {
    /// Speaker placeholder (e.g. `"{{user1}}"`).
    pub user: String,
    /// What the speaker said.
    pub content: Content,
}

impl ActionExample {
    /// Creates an example turn.
    pub fn new(user: impl Into<String>, content: Content) -> Self {
        Self {
            user: user.into(),
            content,
        }
    }
}

/// Kind of Telegram poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollType {
    /// Ordinary poll with any number of votes per option.
    #[default]
    Regular,
    /// Quiz with a single correct answer.
    Quiz,
}

impl fmt::Display for PollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Regular => "regular",
            Self::Quiz => "quiz",
        };
        write!(f, "{}", s)
    }
}

/// Platform-agnostic description of a poll to be created.
///
/// Carried as the `metadata` of a `SEND_POLL` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSpec {
    /// Chat the poll should be posted to.
    pub chat_id: Option<i64>,
    /// Poll question.
    pub question: String,
    /// Ballot options, in display order.
    pub options: Vec<String>,
    /// Whether votes are anonymous.
    pub is_anonymous: bool,
    /// Poll kind.
    #[serde(rename = "type")]
    pub poll_type: PollType,
}

impl PollSpec {
    /// Decodes the poll carried by a `SEND_POLL` response.
    ///
    /// Returns `None` for any other response kind or malformed metadata.
    pub fn from_content(content: &Content) -> Option<Self> {
        if content.action.as_deref() != Some(SEND_POLL) {
            return None;
        }
        content
            .metadata
            .clone()
            .and_then(|m| serde_json::from_value(m).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_poll_type_display() {
        assert_eq!(PollType::Regular.to_string(), "regular");
        assert_eq!(PollType::Quiz.to_string(), "quiz");
    }

    #[test]
    fn test_poll_spec_serializes_type_field() {
        let spec = PollSpec {
            chat_id: Some(42),
            question: "Lunch?".to_string(),
            options: vec!["Yes".to_string(), "No".to_string()],
            is_anonymous: true,
            poll_type: PollType::Regular,
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "regular");
        assert_eq!(value["chat_id"], 42);
        assert_eq!(value["is_anonymous"], true);
    }

    #[test]
    fn test_poll_spec_from_content() {
        let content = Content::text("Lunch?")
            .with_action(SEND_POLL)
            .with_source(TELEGRAM_SOURCE);
        let content = Content {
            metadata: Some(serde_json::json!({
                "chat_id": 7,
                "question": "Lunch?",
                "options": ["Yes", "No"],
                "is_anonymous": true,
                "type": "quiz"
            })),
            ..content
        };

        let spec = PollSpec::from_content(&content).unwrap();
        assert_eq!(spec.chat_id, Some(7));
        assert_eq!(spec.options, vec!["Yes", "No"]);
        assert_eq!(spec.poll_type, PollType::Quiz);
    }

    #[test]
    fn test_poll_spec_from_error_content() {
        let content = Content::text("Failed to create poll: nope").with_action(CREATE_POLL_ERROR);
        assert!(PollSpec::from_content(&content).is_none());
    }

    #[test]
    fn test_content_source() {
        assert!(Content::text("hi").with_source("telegram").is_from_telegram());
        assert!(!Content::text("hi").with_source("discord").is_from_telegram());
        assert!(!Content::text("hi").is_from_telegram());
    }

    #[test]
    fn test_content_skips_empty_fields() {
        let value = serde_json::to_value(Content::text("hi")).unwrap();
        assert_eq!(value, serde_json::json!({ "text": "hi" }));
    }
}
