//! Live membership lookup.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatRef, MemberStatus, UserId};

/// Looks up a user's current status in a chat (Telegram `getChatMember`).
///
/// Any failure (network, unknown chat, bot not in chat) is returned as an error; the caller decides
/// how to classify it.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    async fn get_chat_member(&self, chat: &ChatRef, user_id: UserId) -> Result<MemberStatus>;
}
