//! # gate-cli
//!
//! CLI for membership gating: argument parsing and the `check` / `status` / `settings` commands.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
