use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::history::ChatMessage;

/// Events a client may emit once connected. Frames look like
/// `{"event": "chat message", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "user joined")]
    UserJoined(Option<Announcement>),
    #[serde(rename = "get history")]
    GetHistory,
    #[serde(rename = "chat message")]
    ChatMessage(OutgoingMessage),
    #[serde(rename = "typing")]
    Typing,
    #[serde(rename = "stop typing")]
    StopTyping,
}

/// A late name announcement, either a bare string or `{ "username": ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Announcement {
    Name(String),
    Profile {
        #[serde(default)]
        username: Option<String>,
    },
}

impl Announcement {
    pub fn username(&self) -> Option<&str> {
        match self {
            Announcement::Name(name) => Some(name.as_str()),
            Announcement::Profile { username } => username.as_deref(),
        }
        .map(str::trim)
        .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    #[serde(default)]
    pub username: Option<String>,
    pub message: String,
    #[serde(default)]
    pub user_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub username: String,
    pub message: String,
    pub timestamp: String,
    pub user_color: String,
}

impl From<&ChatMessage> for ChatEntry {
    fn from(message: &ChatMessage) -> Self {
        ChatEntry {
            username: message.username.clone(),
            message: message.message.clone(),
            timestamp: message
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            user_color: message.user_color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "chat history")]
    ChatHistory(Vec<ChatEntry>),
    #[serde(rename = "chat history data")]
    ChatHistoryData(Vec<ChatEntry>),
    #[serde(rename = "chat message")]
    ChatMessage(ChatEntry),
    #[serde(rename = "user joined")]
    UserJoined(String),
    #[serde(rename = "user left")]
    UserLeft(String),
    #[serde(rename = "user count")]
    UserCount(usize),
    #[serde(rename = "typing update")]
    TypingUpdate(Vec<String>),
}
