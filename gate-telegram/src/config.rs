//! Minimal Telegram config: token, API URL, log file, database URL.
//! Loaded from env: BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL), LOG_FILE, DATABASE_URL.

use anyhow::Result;
use std::env;
use tracing::error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://chatgate.db";

pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    pub log_file: Option<String>,
    pub database_url: String,
}

impl TelegramConfig {
    /// BOT_TOKEN is required; everything else is optional.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like [`TelegramConfig::from_env`], but `token` (e.g. from a CLI flag) overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").ok().filter(|s| !s.is_empty());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            database_url,
        })
    }

    /// Uses the given token; other fields take their defaults.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_file: None,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Creates the teloxide bot, pointing it at `telegram_api_url` when set (e.g. a mock server).
pub fn build_bot(config: &TelegramConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token.clone());
    match config.telegram_api_url {
        Some(ref url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}
