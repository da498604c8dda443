//! # gate-core
//!
//! Core types and traits for membership gating: [`ChatRef`], [`UserId`], [`MemberStatus`],
//! [`CheckOutcome`], the collaborator traits ([`Bot`], [`MembershipApi`], [`Continuation`],
//! [`ContinuationDispatcher`]) and tracing initialization. Transport-agnostic; used by storage,
//! membership-checker and gate-telegram.

pub mod bot;
pub mod continuation;
pub mod error;
pub mod logger;
pub mod membership;
pub mod types;

pub use bot::{parse_message_id, Bot};
pub use continuation::{Continuation, ContinuationDispatcher};
pub use error::{ConfigError, GateError, Result};
pub use logger::init_tracing;
pub use membership::MembershipApi;
pub use types::{ChatRef, CheckOutcome, MemberStatus, UserId};
