//! Checker defaults, the configuration surface an admin edits once per bot.
//!
//! Loaded from environment: `GATE_CHATS` (comma-separated chat refs), `GATE_ON_SUCCESS`,
//! `GATE_ON_FAIL` (continuation names) and `GATE_DEBUG` (bool). Per-call options override these.

use std::env;

use gate_core::{ChatRef, ConfigError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerSettings {
    pub chats: Vec<ChatRef>,
    pub on_success: Option<String>,
    pub on_fail: Option<String>,
    pub debug: bool,
}

impl CheckerSettings {
    /// Loads settings from environment variables; every variable is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let chats = match env::var("GATE_CHATS") {
            Ok(raw) => ChatRef::parse_list(&raw)?,
            Err(_) => Vec::new(),
        };
        let debug = match env::var("GATE_DEBUG") {
            Ok(raw) => parse_bool("GATE_DEBUG", &raw)?,
            Err(_) => false,
        };
        Ok(Self {
            chats,
            on_success: non_empty_var("GATE_ON_SUCCESS"),
            on_fail: non_empty_var("GATE_ON_FAIL"),
            debug,
        })
    }

    /// Builds settings from the raw admin-panel fields.
    pub fn from_fields(
        chats: &str,
        on_success: Option<&str>,
        on_fail: Option<&str>,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            chats: ChatRef::parse_list(chats)?,
            on_success: on_success.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            on_fail: on_fail.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            debug,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
