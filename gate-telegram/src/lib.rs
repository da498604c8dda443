//! # gate-telegram
//!
//! Telegram layer for membership gating: type adapters, [`gate_core::MembershipApi`] and
//! [`gate_core::Bot`] implementations over teloxide, and minimal config.
//! Handles only Telegram connectivity; the check chain lives in membership-checker.

mod adapters;
mod bot_adapter;
mod config;
mod membership_api;

pub use adapters::{member_status, recipient, telegram_user_id};
pub use bot_adapter::TelegramBotAdapter;
pub use config::{build_bot, TelegramConfig};
pub use membership_api::TelegramMembershipApi;
