//! Command implementations. Each builds the real stack (SQLite property store, teloxide bot,
//! checker) from env config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gate_core::{ChatRef, CheckOutcome, UserId};
use gate_telegram::{build_bot, TelegramBotAdapter, TelegramConfig, TelegramMembershipApi};
use membership_checker::{
    from_fn, CheckDriver, CheckOptions, CheckerSettings, ContinuationRegistry, MembershipChecker,
};
use storage::{MembershipStore, SqlitePropertyStore};
use tokio::sync::mpsc;
use tracing::info;

/// Continuations the CLI registers; both forward the outcome back to the waiting command.
pub const PRINT_JOINED: &str = "print_joined";
pub const PRINT_MISSING: &str = "print_missing";

/// Parses an optional comma-separated chat list; `None` means "use settings".
pub fn parse_chats(raw: Option<&str>) -> Result<Vec<ChatRef>> {
    match raw {
        Some(raw) => ChatRef::parse_list(raw).context("Parse --chats"),
        None => Ok(Vec::new()),
    }
}

async fn build_checker(
    config: &TelegramConfig,
    registry: ContinuationRegistry,
) -> Result<(MembershipChecker, CheckDriver)> {
    let settings = CheckerSettings::from_env().context("Load checker settings (GATE_*)")?;
    let props = SqlitePropertyStore::new(&config.database_url)
        .await
        .context("Open property store (check DATABASE_URL)")?;
    let bot = build_bot(config);

    Ok(MembershipChecker::builder(
        Arc::new(TelegramMembershipApi::new(bot.clone())),
        MembershipStore::new(Arc::new(props)),
        Arc::new(registry),
    )
    .bot(Arc::new(TelegramBotAdapter::new(bot)))
    .settings(settings)
    .build())
}

/// Runs one live check and prints the outcome as JSON.
pub async fn run_check(
    user: i64,
    chats: Option<&str>,
    debug: bool,
    timeout_secs: u64,
    token: Option<String>,
) -> Result<()> {
    let config = TelegramConfig::load(token)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<CheckOutcome>();
    let forward = |tx: mpsc::UnboundedSender<CheckOutcome>| {
        from_fn(move |outcome| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(outcome);
                Ok(())
            }
        })
    };
    let registry = ContinuationRegistry::new()
        .with(PRINT_JOINED, forward(tx.clone()))
        .with(PRINT_MISSING, forward(tx));

    let (checker, driver) = build_checker(&config, registry).await?;
    tokio::spawn(driver.run());

    let mut options = CheckOptions::for_user(UserId(user))
        .chats(parse_chats(chats)?)
        .on_all_joined(PRINT_JOINED)
        .on_any_missing(PRINT_MISSING);
    if debug {
        options = options.debug(true);
    }

    let check_id = checker.check(options)?;
    info!(check_id = %check_id, user_id = user, "Waiting for check to finish");

    let outcome = tokio::time::timeout(Duration::from_secs(timeout_secs), rx.recv())
        .await
        .context("Timed out waiting for the check to finish")?
        .context("Check finished without an outcome")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Prints cached membership (`is_member` and `get_missing_stored`) without calling Telegram.
pub async fn run_status(user: i64, chats: Option<&str>) -> Result<()> {
    let config = TelegramConfig::from_env()?;
    let (checker, _driver) = build_checker(&config, ContinuationRegistry::new()).await?;

    let chats = parse_chats(chats)?;
    let user_id = Some(UserId(user));
    let is_member = checker.is_member(&chats, user_id).await?;
    let missing = checker.get_missing_stored(&chats, user_id).await?;

    let status = serde_json::json!({
        "user_id": user,
        "is_member": is_member,
        "missing": missing,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub fn run_settings() -> Result<()> {
    let settings = CheckerSettings::from_env().context("Load checker settings (GATE_*)")?;
    let chats = settings
        .chats
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    println!("chats:      {}", if chats.is_empty() { "-".to_string() } else { chats.join(", ") });
    println!("on_success: {}", settings.on_success.as_deref().unwrap_or("-"));
    println!("on_fail:    {}", settings.on_fail.as_deref().unwrap_or("-"));
    println!("debug:      {}", settings.debug);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chats() {
        assert!(parse_chats(None).unwrap().is_empty());
        assert_eq!(
            parse_chats(Some("@a, -100")).unwrap(),
            vec![ChatRef::Username("a".to_string()), ChatRef::Id(-100)]
        );
        assert!(parse_chats(Some("@a,bad")).is_err());
    }
}
