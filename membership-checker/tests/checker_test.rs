//! Integration tests for [`membership_checker::MembershipChecker`].
//!
//! Covers: continuation selection and payload, lookup failures, config errors, settings fallback,
//! sequential per-request ordering, concurrent requests, last-write-wins caching, debug reports and
//! scheduler shutdown. Collaborators are test doubles from `mocks.rs`; records live in an in-memory
//! property store.

use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use gate_core::{CheckOutcome, ConfigError, GateError, MemberStatus, Result, UserId};
use membership_checker::{
    from_fn, CheckId, CheckOptions, CheckerSettings, ContinuationRegistry, MembershipChecker,
    MembershipCheckerBuilder,
};
use storage::{InMemoryPropertyStore, MembershipStore};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use mocks::{chat, chats, RecordingBot, RecordingDispatcher, ScriptedMembershipApi};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug,membership_checker=debug"));
        let _ = fmt().with_env_filter(env_filter).with_test_writer().try_init();
    });
}

struct Harness {
    api: Arc<ScriptedMembershipApi>,
    store: MembershipStore,
    dispatcher: Arc<RecordingDispatcher>,
    bot: Arc<RecordingBot>,
    settings: CheckerSettings,
}

impl Harness {
    fn new(api: ScriptedMembershipApi) -> Self {
        init_tracing();
        Self {
            api: Arc::new(api),
            store: MembershipStore::new(Arc::new(InMemoryPropertyStore::new())),
            dispatcher: Arc::new(RecordingDispatcher::new()),
            bot: Arc::new(RecordingBot::new()),
            settings: CheckerSettings::default(),
        }
    }

    fn with_settings(mut self, settings: CheckerSettings) -> Self {
        self.settings = settings;
        self
    }

    fn builder(&self) -> MembershipCheckerBuilder {
        MembershipChecker::builder(self.api.clone(), self.store.clone(), self.dispatcher.clone())
            .bot(self.bot.clone())
            .settings(self.settings.clone())
    }

    /// Starts every check, drops the checker and runs the driver until all chains finalized.
    async fn run(&self, options: Vec<CheckOptions>) -> Vec<Result<CheckId>> {
        let (checker, driver) = self.builder().build();
        let results = options.into_iter().map(|o| checker.check(o)).collect();
        drop(checker);
        tokio::time::timeout(Duration::from_secs(5), driver.run())
            .await
            .expect("driver should stop once all chains finalized");
        results
    }

    /// A checker over the same store, for cached reads only.
    fn reader(&self) -> MembershipChecker {
        self.builder().build().0
    }
}

fn options(user: i64, chat_refs: &[&str]) -> CheckOptions {
    CheckOptions::for_user(UserId(user))
        .chats(chats(chat_refs))
        .on_all_joined("X")
        .on_any_missing("Y")
}

/// **Test: One chat left → fail continuation with the missing chat.**
///
/// **Setup:** `@a` member, `@b` left for user 1.
/// **Action:** `check([@a, @b], X, Y)` and run to completion.
/// **Expected:** Exactly one run: `Y` with `{joined: false, missing: [@b], user_id: 1}`; records
/// `@a = true`, `@b = false`.
#[tokio::test]
async fn test_missing_chat_fires_fail_continuation() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Member)
            .status(1, "@b", MemberStatus::Left),
    );

    let results = harness.run(vec![options(1, &["@a", "@b"])]).await;
    assert!(results[0].is_ok());

    assert_eq!(
        harness.dispatcher.runs(),
        vec![(
            "Y".to_string(),
            CheckOutcome {
                joined: false,
                missing: chats(&["@b"]),
                user_id: UserId(1),
            }
        )]
    );
    assert_eq!(harness.store.lookup(UserId(1), &chat("@a")).await.unwrap(), Some(true));
    assert_eq!(harness.store.lookup(UserId(1), &chat("@b")).await.unwrap(), Some(false));
}

/// **Test: Creator, administrator and member all count as joined.**
///
/// **Setup:** user 1 is creator of `@a`, administrator of `@b`, member of `-1001`.
/// **Action:** Check all three.
/// **Expected:** `X` runs once with `{joined: true, missing: []}`; `is_member` is true and
/// `get_missing_stored` is empty.
#[tokio::test]
async fn test_all_joined_fires_success_continuation() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Creator)
            .status(1, "@b", MemberStatus::Administrator)
            .status(1, "-1001", MemberStatus::Member),
    );
    let all = chats(&["@a", "@b", "-1001"]);

    harness.run(vec![options(1, &["@a", "@b", "-1001"])]).await;

    assert_eq!(
        harness.dispatcher.runs(),
        vec![("X".to_string(), CheckOutcome::new(UserId(1), Vec::new()))]
    );
    let reader = harness.reader();
    assert!(reader.is_member(&all, Some(UserId(1))).await.unwrap());
    assert!(reader
        .get_missing_stored(&all, Some(UserId(1)))
        .await
        .unwrap()
        .is_empty());
}

/// **Test: Restricted and kicked users are not joined.**
#[tokio::test]
async fn test_restricted_and_kicked_are_missing() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Restricted)
            .status(1, "@b", MemberStatus::Member)
            .status(1, "@c", MemberStatus::Kicked),
    );

    harness.run(vec![options(1, &["@a", "@b", "@c"])]).await;

    let runs = harness.dispatcher.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, "Y");
    assert_eq!(runs[0].1.missing, chats(&["@a", "@c"]));
}

/// **Test: A failing lookup counts as missing and writes no record.**
///
/// **Setup:** `@a` member; lookup for `@c` fails (bot not in chat); `@d` member.
/// **Action:** Check `[@a, @c, @d]`.
/// **Expected:** Chain finalizes with `missing = [@c]`; `@c` has no cached record; `@d` was still
/// checked.
#[tokio::test]
async fn test_lookup_failure_counts_as_missing_without_record() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Member)
            .failing(1, "@c")
            .status(1, "@d", MemberStatus::Member),
    );

    harness.run(vec![options(1, &["@a", "@c", "@d"])]).await;

    let runs = harness.dispatcher.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].1.missing, chats(&["@c"]));
    assert_eq!(harness.store.lookup(UserId(1), &chat("@c")).await.unwrap(), None);
    assert_eq!(harness.store.lookup(UserId(1), &chat("@d")).await.unwrap(), Some(true));
    assert_eq!(harness.api.calls_for(1), chats(&["@a", "@c", "@d"]));
}

/// **Test: Empty chats without settings fallback fail synchronously.**
///
/// **Setup:** Default settings (no chats).
/// **Action:** `check` with no chats; `check` with no user.
/// **Expected:** `ConfigError::NoChats` / `ConfigError::NoUser`; no lookup, no continuation.
#[tokio::test]
async fn test_config_errors_are_synchronous() {
    let harness = Harness::new(ScriptedMembershipApi::new());

    let results = harness
        .run(vec![
            CheckOptions::for_user(UserId(1)).on_any_missing("Y"),
            CheckOptions::default().chats(chats(&["@a"])),
        ])
        .await;

    assert!(matches!(results[0], Err(GateError::Config(ConfigError::NoChats))));
    assert!(matches!(results[1], Err(GateError::Config(ConfigError::NoUser))));
    assert!(harness.api.calls().is_empty());
    assert!(harness.dispatcher.runs().is_empty());
}

/// **Test: Cached reads validate their arguments too.**
#[tokio::test]
async fn test_cached_reads_require_chats_and_user() {
    let harness = Harness::new(ScriptedMembershipApi::new());
    let reader = harness.reader();

    assert!(matches!(
        reader.is_member(&[], Some(UserId(1))).await,
        Err(GateError::Config(ConfigError::NoChats))
    ));
    assert!(matches!(
        reader.get_missing_stored(&chats(&["@a"]), None).await,
        Err(GateError::Config(ConfigError::NoUser))
    ));
}

/// **Test: Chats and continuation names fall back to settings.**
///
/// **Setup:** Settings `chats = "@a,@b"`, `on_success = "welcome"`, `on_fail = "subscribe"`.
/// **Action:** Check user 1 with no per-call chats/continuations, then user 2.
/// **Expected:** User 1 (joined both) runs `welcome`; user 2 (left `@b`) runs `subscribe`.
#[tokio::test]
async fn test_settings_fallback() {
    let settings =
        CheckerSettings::from_fields("@a,@b", Some("welcome"), Some("subscribe"), false).unwrap();
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Member)
            .status(1, "@b", MemberStatus::Member)
            .status(2, "@a", MemberStatus::Member)
            .status(2, "@b", MemberStatus::Left),
    )
    .with_settings(settings);

    harness
        .run(vec![
            CheckOptions::for_user(UserId(1)),
            CheckOptions::for_user(UserId(2)),
        ])
        .await;

    let mut runs = harness.dispatcher.runs();
    runs.sort_by_key(|(_, outcome)| outcome.user_id);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].0, "welcome");
    assert_eq!(runs[1].0, "subscribe");
    assert_eq!(runs[1].1.missing, chats(&["@b"]));

    let reader = harness.reader();
    assert!(reader.is_member(&[], Some(UserId(1))).await.unwrap());
    assert_eq!(
        reader.get_missing_stored(&[], Some(UserId(2))).await.unwrap(),
        chats(&["@b"])
    );
}

/// **Test: Without continuation names the chain still completes and caches results.**
#[tokio::test]
async fn test_unset_continuation_completes_silently() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Left)
            .status(1, "@b", MemberStatus::Member),
    );

    harness
        .run(vec![CheckOptions::for_user(UserId(1)).chats(chats(&["@a", "@b"]))])
        .await;

    assert!(harness.dispatcher.runs().is_empty());
    assert_eq!(harness.store.lookup(UserId(1), &chat("@a")).await.unwrap(), Some(false));
    assert_eq!(harness.store.lookup(UserId(1), &chat("@b")).await.unwrap(), Some(true));
}

/// **Test: Only the relevant continuation is consulted.**
///
/// **Setup:** Only `on_any_missing` set; every chat joined.
/// **Expected:** Nothing runs (the success continuation is unset).
#[tokio::test]
async fn test_only_relevant_continuation_fires() {
    let harness = Harness::new(ScriptedMembershipApi::new().status(1, "@a", MemberStatus::Member));

    harness
        .run(vec![CheckOptions::for_user(UserId(1))
            .chats(chats(&["@a"]))
            .on_any_missing("Y")])
        .await;

    assert!(harness.dispatcher.runs().is_empty());
}

/// **Test: Duplicate chats in a request are looked up once.**
#[tokio::test]
async fn test_duplicate_chats_checked_once() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Left)
            .status(1, "@b", MemberStatus::Member),
    );

    harness.run(vec![options(1, &["@a", "@b", "@a"])]).await;

    assert_eq!(harness.api.calls_for(1), chats(&["@a", "@b"]));
    assert_eq!(harness.dispatcher.runs()[0].1.missing, chats(&["@a"]));
}

/// **Test: Usernames differing only in case are the same chat.**
///
/// **Setup:** `@news` left, `@a` member for user 1.
/// **Action:** Check `[@a, @News, @news]`; then read the cache with `[@A]` and `[@NEWS]`.
/// **Expected:** `@news` looked up once and missing once; cached reads find the records
/// regardless of case.
#[tokio::test]
async fn test_username_case_does_not_split_chats() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Member)
            .status(1, "@news", MemberStatus::Left),
    );

    harness.run(vec![options(1, &["@a", "@News", "@news"])]).await;

    assert_eq!(harness.api.calls_for(1), chats(&["@a", "@news"]));
    assert_eq!(harness.dispatcher.runs()[0].1.missing, chats(&["@news"]));

    let reader = harness.reader();
    assert!(reader.is_member(&chats(&["@A"]), Some(UserId(1))).await.unwrap());
    assert_eq!(
        reader
            .get_missing_stored(&chats(&["@A", "@NEWS"]), Some(UserId(1)))
            .await
            .unwrap(),
        chats(&["@news"])
    );
}

/// **Test: A failed lookup leaves an earlier cached record in place.**
///
/// **Setup:** First check with user 1 a member of `@c`.
/// **Action:** Make the `@c` lookup fail and check again.
/// **Expected:** Second outcome is `{joined: false, missing: [@c]}`, but the cached `@c = true`
/// record from the first check survives, so `is_member` stays true.
#[tokio::test]
async fn test_failed_lookup_keeps_previous_record() {
    let harness = Harness::new(ScriptedMembershipApi::new().status(1, "@c", MemberStatus::Member));

    harness.run(vec![options(1, &["@c"])]).await;
    assert!(harness.dispatcher.runs()[0].1.joined);

    harness.api.set(1, "@c", None);
    harness.run(vec![options(1, &["@c"])]).await;

    let runs = harness.dispatcher.runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(
        runs[1],
        (
            "Y".to_string(),
            CheckOutcome {
                joined: false,
                missing: chats(&["@c"]),
                user_id: UserId(1),
            }
        )
    );
    assert_eq!(harness.store.lookup(UserId(1), &chat("@c")).await.unwrap(), Some(true));
    assert!(harness
        .reader()
        .is_member(&chats(&["@c"]), Some(UserId(1)))
        .await
        .unwrap());
}

/// **Test: Concurrent requests for different users stay sequential and independent.**
///
/// **Setup:** Users 1 and 2 over the same five chats with different memberships.
/// **Action:** Start both checks before running the driver.
/// **Expected:** Each user's lookups follow the request order; each outcome lists only that
/// user's missing chats, in request order.
#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let refs = ["@a", "@b", "@c", "@d", "@e"];
    let mut api = ScriptedMembershipApi::new();
    for (i, r) in refs.iter().enumerate() {
        let user1 = if i % 2 == 0 { MemberStatus::Member } else { MemberStatus::Left };
        let user2 = if i == 4 { MemberStatus::Left } else { MemberStatus::Administrator };
        api = api.status(1, r, user1).status(2, r, user2);
    }
    let harness = Harness::new(api);

    harness
        .run(vec![options(1, &refs), options(2, &refs)])
        .await;

    assert_eq!(harness.api.calls_for(1), chats(&refs));
    assert_eq!(harness.api.calls_for(2), chats(&refs));

    let mut runs = harness.dispatcher.runs();
    runs.sort_by_key(|(_, outcome)| outcome.user_id);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].1.missing, chats(&["@b", "@d"]));
    assert_eq!(runs[1].1.missing, chats(&["@e"]));
}

/// **Test: A later check overwrites cached records (last write wins).**
///
/// **Setup:** Spawned driver; continuations registered in a `ContinuationRegistry` that forwards
/// outcomes to a channel.
/// **Action:** Check while user is a member of `@a`; then flip `@a` to left and check again.
/// **Expected:** First outcome joined, second not; afterwards `is_member` is false and
/// `get_missing_stored` returns `[@a]`.
#[tokio::test]
async fn test_later_check_overwrites_cache() {
    init_tracing();
    let api = Arc::new(
        ScriptedMembershipApi::new()
            .status(1, "@a", MemberStatus::Member)
            .status(1, "@b", MemberStatus::Member),
    );
    let store = MembershipStore::new(Arc::new(InMemoryPropertyStore::new()));

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, CheckOutcome)>();
    let forward = |name: &'static str| {
        let tx = tx.clone();
        from_fn(move |outcome| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((name.to_string(), outcome));
                Ok(())
            }
        })
    };
    let registry = ContinuationRegistry::new()
        .with("X", forward("X"))
        .with("Y", forward("Y"));

    let checker = MembershipChecker::builder(api.clone(), store, Arc::new(registry)).spawn();
    let both = chats(&["@a", "@b"]);

    checker.check(options(1, &["@a", "@b"])).unwrap();
    let (name, first) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("first outcome")
        .expect("channel open");
    assert_eq!(name, "X");
    assert!(first.joined);
    assert!(checker.is_member(&both, Some(UserId(1))).await.unwrap());

    api.set(1, "@a", Some(MemberStatus::Left));
    checker.check(options(1, &["@a", "@b"])).unwrap();
    let (name, second) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("second outcome")
        .expect("channel open");
    assert_eq!(name, "Y");
    assert_eq!(second.missing, chats(&["@a"]));

    assert!(!checker.is_member(&both, Some(UserId(1))).await.unwrap());
    assert_eq!(
        checker.get_missing_stored(&both, Some(UserId(1))).await.unwrap(),
        chats(&["@a"])
    );

    // never a second continuation for the same chain
    assert!(tokio::time::timeout(Duration::from_millis(200), rx.recv())
        .await
        .is_err());
}

/// **Test: An unknown continuation name does not break the chain.**
#[tokio::test]
async fn test_unknown_continuation_is_absorbed() {
    init_tracing();
    let api = Arc::new(ScriptedMembershipApi::new().status(1, "@a", MemberStatus::Member));
    let store = MembershipStore::new(Arc::new(InMemoryPropertyStore::new()));

    let (checker, driver) =
        MembershipChecker::builder(api, store.clone(), Arc::new(ContinuationRegistry::new()))
            .build();
    checker.check(options(1, &["@a"])).unwrap();
    drop(checker);
    tokio::time::timeout(Duration::from_secs(5), driver.run())
        .await
        .expect("driver stops");

    assert_eq!(store.lookup(UserId(1), &chat("@a")).await.unwrap(), Some(true));
}

/// **Test: Debug requests report progress through the bot.**
///
/// **Setup:** `@a` member, `@b` left; debug enabled per call.
/// **Action:** Check `[@a, @b]`.
/// **Expected:** One message sent to the user's chat; edited once per chat and once more with the
/// outcome; the last edit lists `@b` as missing.
#[tokio::test]
async fn test_debug_reports_progress() {
    let harness = Harness::new(
        ScriptedMembershipApi::new()
            .status(7, "@a", MemberStatus::Member)
            .status(7, "@b", MemberStatus::Left),
    );

    harness.run(vec![options(7, &["@a", "@b"]).debug(true)]).await;

    let sent = harness.bot.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 7);
    assert_eq!(sent[0].1, "Membership check: 0/2 chats");

    let edits = harness.bot.edits();
    assert_eq!(edits.len(), 3);
    assert!(edits.iter().all(|(chat_id, id, _)| *chat_id == 7 && id == "42"));
    assert_eq!(edits[0].2, "Membership check: 1/2 chats\n@a: member");
    assert_eq!(
        edits[2].2,
        "Membership check: 2/2 chats\n@a: member\n@b: left\n\nMissing: @b"
    );
}

/// **Test: Without debug nothing is sent.**
#[tokio::test]
async fn test_no_debug_no_messages() {
    let harness = Harness::new(ScriptedMembershipApi::new().status(1, "@a", MemberStatus::Member));

    harness.run(vec![options(1, &["@a"])]).await;

    assert!(harness.bot.sent().is_empty());
    assert!(harness.bot.edits().is_empty());
}

/// **Test: `check` fails once the driver is gone.**
#[tokio::test]
async fn test_check_after_driver_dropped() {
    let harness = Harness::new(ScriptedMembershipApi::new());
    let (checker, driver) = harness.builder().build();
    drop(driver);

    assert!(matches!(
        checker.check(options(1, &["@a"])),
        Err(GateError::SchedulerClosed)
    ));
}
