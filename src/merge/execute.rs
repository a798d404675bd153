//! Merge execution with retries

use crate::error::{Error, Result};
use crate::merge::{MergeContext, RetryOutcome};
use crate::types::MergeRequest;
use tracing::{debug, info, warn};

/// GitHub's message when branch protection wants a review we do not have
pub const REVIEW_REQUIRED_MESSAGE: &str = "review is required by reviewers with write access";

/// Decide whether a failed merge call is worth retrying.
///
/// A missing required review will not appear by waiting, so it is terminal.
/// Everything else (rate limits, network errors, mergeability still being
/// computed, base branch moving) is treated as transient.
pub fn classify_merge_error(error: &Error) -> RetryOutcome {
    if error.to_string().contains(REVIEW_REQUIRED_MESSAGE) {
        RetryOutcome::Failure
    } else {
        RetryOutcome::Retry
    }
}

/// Issue one merge call and classify the result.
///
/// Only cancellation is returned as `Err`.
pub async fn try_merge(ctx: &MergeContext<'_>, request: &MergeRequest) -> Result<RetryOutcome> {
    let pr_number = request.number;
    match ctx.call(ctx.platform.merge_pull_request(request)).await {
        Ok(()) => {
            debug!(pr_number, "merge call succeeded");
            Ok(RetryOutcome::Success)
        }
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            let outcome = classify_merge_error(&e);
            warn!(pr_number, error = %e, ?outcome, "merge call failed");
            let message = if outcome == RetryOutcome::Failure {
                format!("Failed to merge PR #{pr_number}, not retrying: {e}")
            } else {
                format!("Failed to merge PR #{pr_number}: {e}")
            };
            ctx.progress.on_warning(&message).await;
            Ok(outcome)
        }
    }
}

/// Merge with retries.
///
/// The first attempt merges directly. Later attempts re-fetch the PR first
/// and report success if it is already merged, since an earlier call may
/// have gone through even though its response was lost.
pub async fn merge_with_retry(ctx: &MergeContext<'_>, request: &MergeRequest) -> Result<bool> {
    let pr_number = request.number;
    let runner = ctx.config.retry_runner();
    let mut exhausted = false;

    ctx.progress
        .on_message(&format!(
            "Merging PR #{pr_number} ({}, head {})",
            request.method, request.sha
        ))
        .await;

    let merged = runner
        .run(
            &ctx.cancel,
            || try_merge(ctx, request),
            |attempt| async move {
                debug!(pr_number, attempt, "re-fetching PR before merge retry");
                match ctx.call(ctx.platform.get_pull_request(pr_number)).await {
                    Ok(fresh) if fresh.merged => {
                        ctx.progress
                            .on_message(&format!("PR #{pr_number} is already merged"))
                            .await;
                        Ok(RetryOutcome::Success)
                    }
                    Ok(_) => try_merge(ctx, request).await,
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
                info!(pr_number, retries = runner.retries, "merge attempts exhausted");
                exhausted = true;
            },
        )
        .await?;

    if exhausted {
        ctx.progress
            .on_warning(&format!(
                "PR #{pr_number} could not be merged after {} tries",
                runner.retries + 1
            ))
            .await;
    }
    Ok(merged)
}
