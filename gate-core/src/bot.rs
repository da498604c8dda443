//! Messaging abstraction used for debug reporting.
//!
//! [`Bot`] is transport-agnostic; gate-telegram implements it via teloxide.

use crate::error::{GateError, Result};
use async_trait::async_trait;

/// Sends and edits messages. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message and returns its id, for a later [`Bot::edit_message`].
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String>;
    /// Replaces the text of an already-sent message. `message_id` is transport-specific.
    async fn edit_message(&self, chat_id: i64, message_id: &str, text: &str) -> Result<()>;
}

/// Parses a message id string into an i32. Used by edit_message.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| GateError::Bot(format!("Invalid message_id for edit: {}", s)))
}
