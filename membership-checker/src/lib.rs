//! # membership-checker
//!
//! Checks a user's membership across an ordered list of chats, one chat per scheduling tick,
//! persists each result in a [`storage::MembershipStore`] and fires exactly one continuation
//! depending on whether anything is missing.
//!
//! [`MembershipChecker::check`] validates and enqueues; a [`CheckDriver`] advances queued
//! [`CheckState`]s. Cached results are read back with [`MembershipChecker::is_member`] and
//! [`MembershipChecker::get_missing_stored`].

mod checker;
mod registry;
mod report;
mod request;
mod settings;
mod state;

pub use checker::{CheckDriver, MembershipChecker, MembershipCheckerBuilder};
pub use registry::{from_fn, ContinuationRegistry, FnContinuation};
pub use request::{CheckOptions, CheckRequest};
pub use settings::CheckerSettings;
pub use state::{CheckId, CheckState, Finalized};
