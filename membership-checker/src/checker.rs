//! [`MembershipChecker`] validates and enqueues checks; [`CheckDriver`] advances them.
//!
//! Each queued job carries a [`CheckState`] and a sender for re-queueing. A step looks up one chat,
//! persists the result and sends the advanced state back to the queue rather than recursing, so
//! independent checks interleave while each one stays strictly sequential. Because every job
//! holds a sender, the queue closes only after all checker handles are dropped and every chain
//! has finalized.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gate_core::{
    Bot, ChatRef, ConfigError, ContinuationDispatcher, GateError, MembershipApi, Result, UserId,
};
use storage::{MembershipRecord, MembershipStore};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::report::DebugReport;
use crate::request::{resolve_chats, CheckOptions};
use crate::settings::CheckerSettings;
use crate::state::{CheckId, CheckState, Finalized};

struct Job {
    state: CheckState,
    requeue: mpsc::UnboundedSender<Job>,
}

/// Handle for starting checks and reading cached results. Cheap to clone.
#[derive(Clone)]
pub struct MembershipChecker {
    queue: mpsc::UnboundedSender<Job>,
    store: MembershipStore,
    settings: Arc<CheckerSettings>,
    next_id: Arc<AtomicU64>,
}

pub struct MembershipCheckerBuilder {
    api: Arc<dyn MembershipApi>,
    store: MembershipStore,
    dispatcher: Arc<dyn ContinuationDispatcher>,
    bot: Option<Arc<dyn Bot>>,
    settings: CheckerSettings,
}

impl MembershipCheckerBuilder {
    /// Messaging used for debug progress reports. Without it debug requests report nothing.
    pub fn bot(mut self, bot: Arc<dyn Bot>) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn settings(mut self, settings: CheckerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the checker and the driver that must be run for checks to progress.
    pub fn build(self) -> (MembershipChecker, CheckDriver) {
        let (queue, jobs) = mpsc::unbounded_channel();
        let checker = MembershipChecker {
            queue,
            store: self.store.clone(),
            settings: Arc::new(self.settings),
            next_id: Arc::new(AtomicU64::new(1)),
        };
        let driver = CheckDriver {
            jobs,
            ctx: Arc::new(StepContext {
                api: self.api,
                store: self.store,
                dispatcher: self.dispatcher,
                bot: self.bot,
            }),
        };
        (checker, driver)
    }

    /// Builds and spawns the driver on the current tokio runtime.
    pub fn spawn(self) -> MembershipChecker {
        let (checker, driver) = self.build();
        tokio::spawn(driver.run());
        checker
    }
}

impl MembershipChecker {
    pub fn builder(
        api: Arc<dyn MembershipApi>,
        store: MembershipStore,
        dispatcher: Arc<dyn ContinuationDispatcher>,
    ) -> MembershipCheckerBuilder {
        MembershipCheckerBuilder {
            api,
            store,
            dispatcher,
            bot: None,
            settings: CheckerSettings::default(),
        }
    }

    /// Validates `options` against the settings and schedules the chain. Returns immediately;
    /// at most one continuation fires later.
    #[instrument(skip(self, options), fields(user_id = ?options.user_id))]
    pub fn check(&self, options: CheckOptions) -> Result<CheckId> {
        let request = options.resolve(&self.settings)?;
        let id = CheckId(self.next_id.fetch_add(1, Ordering::Relaxed));

        info!(
            check_id = %id,
            user_id = request.user_id.0,
            chats = request.chats.len(),
            debug = request.debug,
            "step: check scheduled"
        );

        let state = CheckState::new(id, request);
        self.queue
            .send(Job {
                state,
                requeue: self.queue.clone(),
            })
            .map_err(|_| GateError::SchedulerClosed)?;
        Ok(id)
    }

    /// True iff every chat has a cached "member" record. Never triggers a live lookup.
    pub async fn is_member(&self, chats: &[ChatRef], user_id: Option<UserId>) -> Result<bool> {
        Ok(self.get_missing_stored(chats, user_id).await?.is_empty())
    }

    /// Chats without a cached "member" record, in input order. Empty `chats` falls back to the
    /// settings.
    pub async fn get_missing_stored(
        &self,
        chats: &[ChatRef],
        user_id: Option<UserId>,
    ) -> Result<Vec<ChatRef>> {
        let chats = resolve_chats(chats, &self.settings)?;
        let user_id = user_id.ok_or(ConfigError::NoUser)?;
        Ok(self.store.missing(&chats, user_id).await?)
    }

    pub fn settings(&self) -> &CheckerSettings {
        &self.settings
    }

    pub fn store(&self) -> &MembershipStore {
        &self.store
    }
}

/// Consumes the check queue. Stops once every [`MembershipChecker`] handle is dropped and no
/// chain is in flight.
pub struct CheckDriver {
    jobs: mpsc::UnboundedReceiver<Job>,
    ctx: Arc<StepContext>,
}

impl CheckDriver {
    pub async fn run(mut self) {
        info!("Check driver started");
        while let Some(job) = self.jobs.recv().await {
            let ctx = self.ctx.clone();
            tokio::spawn(ctx.step(job));
        }
        info!("Check driver stopped");
    }
}

struct StepContext {
    api: Arc<dyn MembershipApi>,
    store: MembershipStore,
    dispatcher: Arc<dyn ContinuationDispatcher>,
    bot: Option<Arc<dyn Bot>>,
}

impl StepContext {
    async fn step(self: Arc<Self>, job: Job) {
        let Job { mut state, requeue } = job;
        let Some(chat) = state.current_chat().cloned() else {
            self.finalize(state).await;
            return;
        };

        self.start_report(&mut state).await;

        let check_id = state.id();
        let user_id = state.user_id();
        let index = state.current_index();

        let (joined, line) = match self.api.get_chat_member(&chat, user_id).await {
            Ok(status) => {
                let joined = status.is_joined();
                info!(
                    check_id = %check_id,
                    user_id = user_id.0,
                    chat = %chat,
                    step = index,
                    status = %status,
                    joined,
                    "step: membership looked up"
                );
                let record = MembershipRecord {
                    user_id,
                    chat: chat.clone(),
                    joined,
                };
                if let Err(e) = self.store.save(&record).await {
                    warn!(
                        error = %e,
                        check_id = %check_id,
                        chat = %chat,
                        "Failed to persist membership record"
                    );
                }
                (joined, format!("{}: {}", chat, status))
            }
            Err(e) => {
                // No record is written: the state is unknown, not a confirmed non-membership.
                warn!(
                    error = %e,
                    check_id = %check_id,
                    user_id = user_id.0,
                    chat = %chat,
                    step = index,
                    "step: lookup failed, counting chat as missing"
                );
                (false, format!("{}: lookup failed", chat))
            }
        };

        state.advance(joined);
        if let Some(report) = state.report.as_mut() {
            report.lines.push(line);
        }
        self.edit_report(&state, None).await;

        if requeue
            .send(Job {
                state,
                requeue: requeue.clone(),
            })
            .is_err()
        {
            error!(check_id = %check_id, "Check driver stopped, chain dropped");
        }
    }

    async fn finalize(&self, mut state: CheckState) {
        let total = state.request().chats.len();
        let report = state.report.take();
        let Finalized {
            id,
            outcome,
            continuation,
        } = state.finish();

        let missing = outcome
            .missing
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            check_id = %id,
            user_id = outcome.user_id.0,
            joined = outcome.joined,
            missing = %missing,
            "step: check finalized"
        );

        if let (Some(bot), Some(report)) = (&self.bot, report) {
            let footer = if outcome.joined {
                "All chats joined".to_string()
            } else {
                format!("Missing: {}", missing)
            };
            send_edit(bot.as_ref(), outcome.user_id, &report, total, Some(&footer)).await;
        }

        match continuation {
            None => debug!(
                check_id = %id,
                joined = outcome.joined,
                "No continuation set, chain complete"
            ),
            Some(name) => {
                if let Err(e) = self.dispatcher.run(&name, outcome, None).await {
                    error!(error = %e, check_id = %id, continuation = %name, "Continuation failed");
                }
            }
        }
    }

    /// Sends the progress message the first time a debug chain steps.
    async fn start_report(&self, state: &mut CheckState) {
        let Some(bot) = &self.bot else {
            return;
        };
        let user_id = state.user_id();
        let total = state.request().chats.len();
        let Some(report) = state.report.as_mut() else {
            return;
        };
        if report.started {
            return;
        }
        report.started = true;

        match bot.send_message(user_id.0, &report.render(total, None)).await {
            Ok(message_id) => report.message_id = Some(message_id),
            Err(e) => warn!(error = %e, user_id = user_id.0, "Failed to send debug report"),
        }
    }

    async fn edit_report(&self, state: &CheckState, footer: Option<&str>) {
        if let (Some(bot), Some(report)) = (&self.bot, &state.report) {
            let total = state.request().chats.len();
            send_edit(bot.as_ref(), state.user_id(), report, total, footer).await;
        }
    }
}

async fn send_edit(
    bot: &dyn Bot,
    user_id: UserId,
    report: &DebugReport,
    total: usize,
    footer: Option<&str>,
) {
    let Some(message_id) = &report.message_id else {
        return;
    };
    if let Err(e) = bot
        .edit_message(user_id.0, message_id, &report.render(total, footer))
        .await
    {
        warn!(error = %e, user_id = user_id.0, "Failed to edit debug report");
    }
}
