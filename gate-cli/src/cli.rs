//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gate")]
#[command(about = "Chat membership gate: live checks and cached membership", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Check a user's membership live and print the outcome (config from env).
    Check {
        /// Telegram user id.
        #[arg(short, long)]
        user: i64,
        /// Comma-separated chats (`@name` or numeric id); defaults to GATE_CHATS.
        #[arg(short, long)]
        chats: Option<String>,
        /// Report progress to the user's private chat.
        #[arg(long)]
        debug: bool,
        /// How long to wait for the check to finish.
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
        /// Overrides BOT_TOKEN.
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Print cached membership for a user without calling Telegram.
    Status {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long)]
        chats: Option<String>,
    },
    /// Print the checker settings resolved from env.
    Settings,
}
