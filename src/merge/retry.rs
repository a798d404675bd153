//! Bounded retry-with-sleep executor
//!
//! Readiness polling and merging share the same shape: one immediate attempt
//! against the state the caller already holds, then up to `retries` follow-up
//! attempts that are expected to re-fetch state before deciding.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Done, stop with success
    Success,
    /// Terminal, stop without retrying
    Failure,
    /// Not decided yet, try again after sleeping
    Retry,
}

/// Retry executor with a fixed number of follow-up attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryRunner {
    /// Follow-up attempts after the immediate one
    pub retries: u32,
    /// Sleep before each follow-up attempt
    pub sleep: Duration,
}

impl RetryRunner {
    /// Create a runner
    pub const fn new(retries: u32, sleep: Duration) -> Self {
        Self { retries, sleep }
    }

    /// Run `immediate`, then `retry` while attempts keep returning `Retry`.
    ///
    /// Returns `Ok(true)` on `Success`, `Ok(false)` on `Failure` or when all
    /// follow-up attempts are used up (after calling `on_exhausted` once).
    /// An attempt returning `Err` stops the loop and propagates the error, as
    /// does cancellation while sleeping.
    pub async fn run<I, IFut, R, RFut, E>(
        &self,
        cancel: &CancellationToken,
        immediate: I,
        mut retry: R,
        on_exhausted: E,
    ) -> Result<bool>
    where
        I: FnOnce() -> IFut,
        IFut: Future<Output = Result<RetryOutcome>>,
        R: FnMut(u32) -> RFut,
        RFut: Future<Output = Result<RetryOutcome>>,
        E: FnOnce(),
    {
        match immediate().await? {
            RetryOutcome::Success => return Ok(true),
            RetryOutcome::Failure => return Ok(false),
            RetryOutcome::Retry => {}
        }

        for attempt in 1..=self.retries {
            debug!(
                attempt,
                retries = self.retries,
                sleep_ms = u64::try_from(self.sleep.as_millis()).unwrap_or(u64::MAX),
                "retrying"
            );
            self.sleep(cancel).await?;

            match retry(attempt).await? {
                RetryOutcome::Success => return Ok(true),
                RetryOutcome::Failure => return Ok(false),
                RetryOutcome::Retry => {}
            }
        }

        on_exhausted();
        Ok(false)
    }

    async fn sleep(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.sleep.is_zero() {
            return Ok(());
        }
        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(self.sleep) => Ok(()),
        }
    }
}
