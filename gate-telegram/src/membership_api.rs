//! [`gate_core::MembershipApi`] over Telegram's `getChatMember`.

use async_trait::async_trait;
use gate_core::{ChatRef, GateError, MemberStatus, MembershipApi, Result, UserId};
use teloxide::prelude::*;
use tracing::debug;

use crate::adapters::{member_status, recipient, telegram_user_id};

/// Looks up chat membership through the Bot API. The bot must be able to see the chat's members
/// (for channels: be an administrator), otherwise the lookup fails.
#[derive(Clone)]
pub struct TelegramMembershipApi {
    bot: teloxide::Bot,
}

impl TelegramMembershipApi {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipApi for TelegramMembershipApi {
    async fn get_chat_member(&self, chat: &ChatRef, user_id: UserId) -> Result<MemberStatus> {
        let member = self
            .bot
            .get_chat_member(recipient(chat), telegram_user_id(user_id)?)
            .await
            .map_err(|e| GateError::Lookup(format!("getChatMember {}: {}", chat, e)))?;

        let status = member_status(&member.kind);
        debug!(chat = %chat, user_id = user_id.0, status = %status, "getChatMember");
        Ok(status)
    }
}
