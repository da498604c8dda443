//! Wraps teloxide::Bot and implements [`gate_core::Bot`]. Production code sends debug reports via
//! Telegram; tests can substitute another Bot impl.

use async_trait::async_trait;
use gate_core::{parse_message_id, Bot as CoreBot, GateError, Result};
use teloxide::{prelude::*, types::ChatId, types::MessageId};

/// Thin wrapper around teloxide::Bot that implements gate-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .map_err(|e| GateError::Bot(e.to_string()))?;
        Ok(sent.id.to_string())
    }

    async fn edit_message(&self, chat_id: i64, message_id: &str, text: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(id), text)
            .await
            .map_err(|e| GateError::Bot(e.to_string()))?;
        Ok(())
    }
}
