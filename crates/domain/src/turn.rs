use serde::{Deserialize, Serialize};

/// Who authored a turn in the normalized history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The other party of the conversation.
    User,
    /// The bot's own account (earlier replies, manual or generated).
    Model,
}

/// One message of normalized conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }
    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, text: text.into() }
    }
}

/// A message as returned by the messaging transport, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Sent by the bot's own account.
    #[serde(rename = "fromMe", alias = "from_me", default)]
    pub from_me: bool,
    #[serde(rename = "body", alias = "text", default)]
    pub text: String,
}

impl RawMessage {
    pub fn own(text: impl Into<String>) -> Self {
        Self { from_me: true, text: text.into() }
    }
    pub fn peer(text: impl Into<String>) -> Self {
        Self { from_me: false, text: text.into() }
    }
}
