//! gate CLI: run a live membership check, read cached membership, show settings.
//! Config from env (`.env` supported) and CLI args.

use anyhow::Result;
use clap::Parser;
use gate_cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_file = std::env::var("LOG_FILE").ok().filter(|path| !path.is_empty());
    gate_core::init_tracing(log_file.as_deref())?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            user,
            chats,
            debug,
            timeout_secs,
            token,
        } => commands::run_check(user, chats.as_deref(), debug, timeout_secs, token).await,
        Commands::Status { user, chats } => commands::run_status(user, chats.as_deref()).await,
        Commands::Settings => commands::run_settings(),
    }
}
