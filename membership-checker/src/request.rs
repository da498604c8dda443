//! Per-call options and the validated request they resolve to.

use std::collections::HashSet;

use gate_core::{ChatRef, ConfigError, UserId};

use crate::settings::CheckerSettings;

/// What the caller passes to `check`. Omitted fields fall back to [`CheckerSettings`].
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub chats: Vec<ChatRef>,
    pub user_id: Option<UserId>,
    pub on_all_joined: Option<String>,
    pub on_any_missing: Option<String>,
    pub debug: Option<bool>,
}

impl CheckOptions {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn chats(mut self, chats: impl IntoIterator<Item = ChatRef>) -> Self {
        self.chats = chats.into_iter().collect();
        self
    }

    pub fn on_all_joined(mut self, name: impl Into<String>) -> Self {
        self.on_all_joined = Some(name.into());
        self
    }

    pub fn on_any_missing(mut self, name: impl Into<String>) -> Self {
        self.on_any_missing = Some(name.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Applies settings fallbacks and validates. Fails with `NoChats` before `NoUser`.
    pub fn resolve(self, settings: &CheckerSettings) -> Result<CheckRequest, ConfigError> {
        let chats = resolve_chats(&self.chats, settings)?;
        let user_id = self.user_id.ok_or(ConfigError::NoUser)?;
        Ok(CheckRequest {
            chats,
            user_id,
            on_all_joined: self.on_all_joined.or_else(|| settings.on_success.clone()),
            on_any_missing: self.on_any_missing.or_else(|| settings.on_fail.clone()),
            debug: self.debug.unwrap_or(settings.debug),
        })
    }
}

/// A validated check: non-empty, duplicate-free chats in check order. Immutable once started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub chats: Vec<ChatRef>,
    pub user_id: UserId,
    pub on_all_joined: Option<String>,
    pub on_any_missing: Option<String>,
    pub debug: bool,
}

/// Uses `chats` if non-empty, else the settings' chats; drops repeats keeping the first.
pub(crate) fn resolve_chats(
    chats: &[ChatRef],
    settings: &CheckerSettings,
) -> Result<Vec<ChatRef>, ConfigError> {
    let source = if chats.is_empty() { &settings.chats } else { chats };
    let mut seen = HashSet::new();
    let unique: Vec<ChatRef> = source
        .iter()
        .filter(|chat| seen.insert(*chat))
        .cloned()
        .collect();
    if unique.is_empty() {
        return Err(ConfigError::NoChats);
    }
    Ok(unique)
}
