//! Core types: user id, chat reference, membership status and the outcome handed to continuations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Telegram user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Chat or channel handle: a public `@username` or a numeric id (negative for groups/channels).
///
/// Telegram usernames are case-insensitive, so parsed usernames are lowercased: `@News` and
/// `@news` compare, hash and display the same. `Display` renders the canonical form, which is
/// also what storage keys are built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChatRef {
    /// Lowercase username without the leading `@`. Build it with [`ChatRef::username`].
    Username(String),
    Id(i64),
}

impl ChatRef {
    pub fn username(name: &str) -> Self {
        ChatRef::Username(name.to_ascii_lowercase())
    }

    /// Parses a comma-separated list (`"@a, @b,-100123"`). Blank entries are skipped.
    pub fn parse_list(s: &str) -> Result<Vec<ChatRef>, ConfigError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ChatRef::from_str)
            .collect()
    }
}

impl FromStr for ChatRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix('@') {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::InvalidChat(s.to_string()));
            }
            return Ok(ChatRef::username(name));
        }
        s.parse::<i64>()
            .map(ChatRef::Id)
            .map_err(|_| ConfigError::InvalidChat(s.to_string()))
    }
}

impl TryFrom<String> for ChatRef {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChatRef> for String {
    fn from(chat: ChatRef) -> Self {
        chat.to_string()
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Username(name) => write!(f, "@{}", name),
            ChatRef::Id(id) => write!(f, "{}", id),
        }
    }
}

/// A user's relationship to a chat, as reported by the membership lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// True for creator, administrator and regular member. Everything else counts as not joined.
    pub fn is_joined(&self) -> bool {
        matches!(
            self,
            MemberStatus::Creator | MemberStatus::Administrator | MemberStatus::Member
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Creator => "creator",
            MemberStatus::Administrator => "administrator",
            MemberStatus::Member => "member",
            MemberStatus::Restricted => "restricted",
            MemberStatus::Left => "left",
            MemberStatus::Kicked => "kicked",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to the continuation fired when a check finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub joined: bool,
    pub missing: Vec<ChatRef>,
    pub user_id: UserId,
}

impl CheckOutcome {
    /// Builds the outcome from the accumulated missing chats; `joined` iff nothing is missing.
    pub fn new(user_id: UserId, missing: Vec<ChatRef>) -> Self {
        Self {
            joined: missing.is_empty(),
            missing,
            user_id,
        }
    }
}
