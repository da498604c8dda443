//! Continuations: named actions invoked when a check finishes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::CheckOutcome;

/// A single action receiving the outcome of a finished check.
#[async_trait]
pub trait Continuation: Send + Sync {
    async fn invoke(&self, outcome: CheckOutcome) -> Result<()>;
}

/// Resolves a continuation by name and runs it, optionally after `delay`.
#[async_trait]
pub trait ContinuationDispatcher: Send + Sync {
    async fn run(&self, name: &str, outcome: CheckOutcome, delay: Option<Duration>) -> Result<()>;
}
