use thiserror::Error;

/// Raised synchronously when a check cannot be resolved from the call and the settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no chats to check (pass chats or set GATE_CHATS)")]
    NoChats,

    #[error("no user id to check")]
    NoUser,

    #[error("invalid chat reference: {0:?}")]
    InvalidChat(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bot error: {0}")]
    Bot(String),

    #[error("Unknown continuation: {0}")]
    UnknownContinuation(String),

    #[error("Check scheduler is closed")]
    SchedulerClosed,
}

pub type Result<T> = std::result::Result<T, GateError>;
