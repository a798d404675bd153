//! Merge engine
//!
//! One flow per pull request:
//! 1. Skip check - never merge PRs the policy rules out
//! 2. Readiness - poll until GitHub considers the PR mergeable
//! 3. Message - compose the commit title/body
//! 4. Merge - merge with retries
//! 5. Cleanup - remove labels, delete the branch (best effort)

mod cleanup;
mod eligibility;
mod execute;
mod message;
mod readiness;
mod retry;

pub use cleanup::{delete_branch, labels_to_remove, remove_labels};
pub use eligibility::{
    SkipReason, count_approvals, evaluate_required_checks, evaluate_skip, should_skip,
};
pub use execute::{REVIEW_REQUIRED_MESSAGE, classify_merge_error, merge_with_retry, try_merge};
pub use message::{apply_extraction_pattern, compose_commit_message, split_commit_message};
pub use readiness::{classify_readiness, wait_until_ready};
pub use retry::{RetryOutcome, RetryRunner};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::types::MergeRequest;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Everything a merge flow needs
///
/// Borrowed, read-only state; several flows may share the same service and
/// config concurrently.
pub struct MergeContext<'a> {
    /// Platform service for API calls
    pub platform: &'a dyn PlatformService,
    /// Merge policy
    pub config: &'a Config,
    /// Progress sink
    pub progress: &'a dyn ProgressCallback,
    /// Aborts remote calls and retry sleeps
    pub cancel: CancellationToken,
}

impl<'a> MergeContext<'a> {
    /// Create a context
    pub fn new(
        platform: &'a dyn PlatformService,
        config: &'a Config,
        progress: &'a dyn ProgressCallback,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            platform,
            config,
            progress,
            cancel,
        }
    }

    /// Run a remote call, giving up with `Error::Cancelled` if the token fires
    pub async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }
}

/// Run the whole flow for one PR.
///
/// Returns `Ok(true)` iff the PR was merged by this call. Skips, PRs that
/// never become ready and failed merges return `Ok(false)`. Only
/// configuration errors, skips under `fail_on_skip` and cancellation are
/// returned as errors.
#[instrument(skip(ctx), fields(repo = %ctx.platform.config()))]
pub async fn merge_pull_request(ctx: &MergeContext<'_>, pr_number: u64) -> Result<bool> {
    match run_flow(ctx, pr_number).await {
        Err(e) if !e.is_fatal() => {
            ctx.progress
                .on_warning(&format!("PR #{pr_number} was not merged: {e}"))
                .await;
            Ok(false)
        }
        other => other,
    }
}

async fn run_flow(ctx: &MergeContext<'_>, pr_number: u64) -> Result<bool> {
    let mut pr = ctx.call(ctx.platform.get_pull_request(pr_number)).await?;
    ctx.progress
        .on_message(&format!("Evaluating PR #{pr_number}: {}", pr.title))
        .await;

    if let Some(reason) = evaluate_skip(ctx, &pr).await? {
        ctx.progress
            .on_message(&format!("Skipping PR #{pr_number}: {reason}"))
            .await;
        if ctx.config.fail_on_skip {
            return Err(Error::Skipped {
                number: pr_number,
                reason: reason.to_string(),
            });
        }
        return Ok(false);
    }

    if !wait_until_ready(ctx, &pr).await? {
        return Ok(false);
    }

    if let Some(pattern) = &ctx.config.commit_message_regex
        && apply_extraction_pattern(pattern, &mut pr)?
    {
        debug!(pr_number, "PR body replaced by extraction pattern");
    }

    let message = compose_commit_message(&ctx.config.commit_message, &pr);
    let (commit_title, commit_message) = split_commit_message(message.as_deref());

    // Pinned to the head we evaluated; a newer push makes GitHub reject the
    // merge instead of merging unvetted commits.
    let request = MergeRequest {
        number: pr_number,
        sha: pr.head.sha.clone(),
        method: ctx.config.merge_method_for(&pr.labels),
        commit_title,
        commit_message,
    };

    if !merge_with_retry(ctx, &request).await? {
        return Ok(false);
    }
    ctx.progress
        .on_message(&format!("PR #{pr_number} merged"))
        .await;

    remove_labels(ctx, &pr).await?;
    delete_branch(ctx, &pr).await?;

    Ok(true)
}
