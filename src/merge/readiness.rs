//! Readiness polling
//!
//! GitHub computes `mergeable_state` asynchronously, so a PR that looks
//! undecided right after a push usually settles after a few seconds.

use crate::error::{Error, Result};
use crate::merge::{MergeContext, RetryOutcome};
use crate::types::{MergeableState, PullRequest};
use tracing::{debug, info};

/// Map a mergeable state onto an attempt outcome.
///
/// - absent, or listed in `ready_states` ⇒ `Success` (probably mergeable)
/// - `dirty`, `draft` ⇒ `Failure`
/// - anything else ⇒ `Retry`
pub fn classify_readiness<S: AsRef<str>>(
    state: Option<&MergeableState>,
    ready_states: &[S],
) -> RetryOutcome {
    match state {
        None => RetryOutcome::Success,
        Some(s) if ready_states.iter().any(|r| r.as_ref() == s.as_str()) => RetryOutcome::Success,
        Some(MergeableState::Dirty | MergeableState::Draft) => RetryOutcome::Failure,
        Some(_) => RetryOutcome::Retry,
    }
}

async fn check_ready(ctx: &MergeContext<'_>, pr: &PullRequest) -> RetryOutcome {
    let outcome = classify_readiness(
        pr.mergeable_state.as_ref(),
        ctx.config.ready_states.as_slice(),
    );
    let state = pr
        .mergeable_state
        .as_ref()
        .map_or("none", MergeableState::as_str);
    debug!(pr_number = pr.number, state, ?outcome, "checked readiness");

    match outcome {
        RetryOutcome::Success => {
            ctx.progress
                .on_message(&format!(
                    "PR #{} is probably ready (mergeable state: {state})",
                    pr.number
                ))
                .await;
        }
        RetryOutcome::Failure => {
            ctx.progress
                .on_message(&format!(
                    "PR #{} can not be merged (mergeable state: {state})",
                    pr.number
                ))
                .await;
        }
        RetryOutcome::Retry => {
            ctx.progress
                .on_message(&format!(
                    "PR #{} is not ready yet (mergeable state: {state})",
                    pr.number
                ))
                .await;
        }
    }
    outcome
}

/// Poll until the PR is mergeable, not mergeable, or attempts run out.
///
/// The first check uses `pr` as-is; later checks re-fetch it. A failed
/// re-fetch counts as "not decided yet". Returns `Ok(false)` when the PR
/// never became ready, which is an expected outcome rather than an error.
pub async fn wait_until_ready(ctx: &MergeContext<'_>, pr: &PullRequest) -> Result<bool> {
    let pr_number = pr.number;
    let runner = ctx.config.retry_runner();
    let mut exhausted = false;

    let ready = runner
        .run(
            &ctx.cancel,
            || async move { Ok(check_ready(ctx, pr).await) },
            |attempt| async move {
                debug!(pr_number, attempt, "re-fetching PR for readiness");
                match ctx.call(ctx.platform.get_pull_request(pr_number)).await {
                    Ok(fresh) => Ok(check_ready(ctx, &fresh).await),
                    Err(Error::Cancelled) => Err(Error::Cancelled),
                    Err(e) => {
                        ctx.progress
                            .on_warning(&format!("Failed to refresh PR #{pr_number}: {e}"))
                            .await;
                        Ok(RetryOutcome::Retry)
                    }
                }
            },
            || {
                info!(pr_number, retries = runner.retries, "PR never became ready");
                exhausted = true;
            },
        )
        .await?;

    if exhausted {
        ctx.progress
            .on_message(&format!(
                "PR #{pr_number} not ready to be merged after {} tries",
                runner.retries + 1
            ))
            .await;
    }
    Ok(ready)
}
