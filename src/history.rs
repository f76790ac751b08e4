use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::store::StoreError;

/// Number of messages replayed on connect and on request.
pub const HISTORY_DEPTH: usize = 50;

pub const DEFAULT_COLOR: &str = "#4ECDC4";

pub const PALETTE: [&str; 20] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA5A5", "#A3D39C", "#7D70BA", "#5B8C85", "#E84855",
    "#3185FC", "#F9C80E", "#FF6F61", "#6A0572", "#AB83A1", "#5C80BC", "#F45B69", "#2EC4B6",
    "#E71D36", "#FF9F1C", "#011627", "#2A9D8F",
];

pub fn random_color() -> &'static str {
    PALETTE[rand::thread_rng().gen_range(0..PALETTE.len())]
}

pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub username: String,
    pub message: String,
    pub user_color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub username: String,
    pub message: String,
    pub user_color: String,
}

/// Durable append-only chat log.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Stores the message, stamping its id and creation time.
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError>;

    /// Up to `limit` messages, newest first.
    async fn latest(&self, limit: usize) -> Result<Vec<ChatMessage>, StoreError>;
}

#[derive(Clone)]
pub struct History {
    log: Arc<dyn MessageLog>,
}

impl History {
    pub fn new(log: Arc<dyn MessageLog>) -> Self {
        Self { log }
    }

    pub async fn append(
        &self,
        username: &str,
        message: &str,
        user_color: &str,
    ) -> Result<ChatMessage, StoreError> {
        // Stored text is trimmed, so surrounding whitespace is not preserved.
        let username = username.trim();
        let message = message.trim();
        if username.is_empty() {
            return Err(StoreError::MissingField("username"));
        }
        if message.is_empty() {
            return Err(StoreError::MissingField("message"));
        }
        let user_color = match user_color.trim() {
            "" => DEFAULT_COLOR,
            color => color,
        };

        self.log
            .append(NewMessage {
                username: username.to_string(),
                message: message.to_string(),
                user_color: user_color.to_string(),
            })
            .await
    }

    /// Up to `limit` most recent messages, oldest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>, StoreError> {
        let mut messages = self.log.latest(limit).await?;
        messages.reverse();
        Ok(messages)
    }
}
