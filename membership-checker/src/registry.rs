//! Named continuations. Callers register actions by name at startup; the checker refers to them
//! by name in requests and settings.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gate_core::{CheckOutcome, Continuation, ContinuationDispatcher, GateError, Result};
use tracing::{error, info};

/// Map from continuation name to action. Implements [`ContinuationDispatcher`].
#[derive(Clone, Default)]
pub struct ContinuationRegistry {
    continuations: HashMap<String, Arc<dyn Continuation>>,
}

impl ContinuationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `continuation` under `name`, replacing any previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        continuation: Arc<dyn Continuation>,
    ) -> &mut Self {
        self.continuations.insert(name.into(), continuation);
        self
    }

    pub fn with(mut self, name: impl Into<String>, continuation: Arc<dyn Continuation>) -> Self {
        self.register(name, continuation);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.continuations.contains_key(name)
    }
}

#[async_trait]
impl ContinuationDispatcher for ContinuationRegistry {
    /// Without a delay the continuation runs inline and its error is returned. With a delay it
    /// runs on a spawned task and errors are only logged.
    async fn run(&self, name: &str, outcome: CheckOutcome, delay: Option<Duration>) -> Result<()> {
        let continuation = self
            .continuations
            .get(name)
            .cloned()
            .ok_or_else(|| GateError::UnknownContinuation(name.to_string()))?;

        info!(
            continuation = %name,
            user_id = outcome.user_id.0,
            joined = outcome.joined,
            delay_ms = delay.map(|d| d.as_millis() as u64),
            "step: running continuation"
        );

        match delay {
            None => continuation.invoke(outcome).await,
            Some(delay) => {
                let name = name.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = continuation.invoke(outcome).await {
                        error!(error = %e, continuation = %name, "Delayed continuation failed");
                    }
                });
                Ok(())
            }
        }
    }
}

/// Adapts an async closure into a [`Continuation`].
pub struct FnContinuation<F> {
    f: F,
}

impl<F, Fut> FnContinuation<F>
where
    F: Fn(CheckOutcome) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Continuation for FnContinuation<F>
where
    F: Fn(CheckOutcome) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn invoke(&self, outcome: CheckOutcome) -> Result<()> {
        (self.f)(outcome).await
    }
}

/// Shorthand for `Arc::new(FnContinuation::new(f))`.
pub fn from_fn<F, Fut>(f: F) -> Arc<dyn Continuation>
where
    F: Fn(CheckOutcome) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnContinuation::new(f))
}
