//! Adapters between Telegram (teloxide) types and gate_core types.
//! Depends only on teloxide and gate_core type definitions.

use gate_core::{ChatRef, GateError, MemberStatus, Result, UserId};
use teloxide::types::{ChatId, ChatMemberKind, Recipient};

/// Maps a chat reference to the recipient teloxide expects (`@username` or numeric id).
pub fn recipient(chat: &ChatRef) -> Recipient {
    match chat {
        ChatRef::Username(name) => Recipient::ChannelUsername(format!("@{}", name)),
        ChatRef::Id(id) => Recipient::Id(ChatId(*id)),
    }
}

/// Telegram user ids are unsigned; negative ids cannot name a user.
pub fn telegram_user_id(user_id: UserId) -> Result<teloxide::types::UserId> {
    u64::try_from(user_id.0)
        .map(teloxide::types::UserId)
        .map_err(|_| GateError::Lookup(format!("Invalid user id: {}", user_id)))
}

/// Collapses teloxide's member kind into [`MemberStatus`].
pub fn member_status(kind: &ChatMemberKind) -> MemberStatus {
    if kind.is_owner() {
        MemberStatus::Creator
    } else if kind.is_administrator() {
        MemberStatus::Administrator
    } else if kind.is_member() {
        MemberStatus::Member
    } else if kind.is_restricted() {
        MemberStatus::Restricted
    } else if kind.is_banned() {
        MemberStatus::Kicked
    } else {
        MemberStatus::Left
    }
}
