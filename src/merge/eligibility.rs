//! Skip decisions
//!
//! A skipped PR is never merged and never retried. This is separate from
//! readiness: a PR that is merely "not ready yet" is polled instead.

use crate::error::Result;
use crate::merge::MergeContext;
use crate::types::{CheckRun, PrState, PullRequest, Review, ReviewState};
use std::fmt;
use tracing::debug;

/// Why a PR will not be merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// PR is not open
    NotOpen(PrState),
    /// PR is already merged
    AlreadyMerged,
    /// PR comes from a fork and fork merging is disabled
    Fork,
    /// PR carries a blocking label
    BlockingLabel(String),
    /// PR lacks a required label
    MissingLabel(String),
    /// PR was opened by someone other than the configured author
    AuthorMismatch {
        /// PR author
        author: String,
        /// Configured author
        expected: String,
    },
    /// No merge method label while one is required
    NoMergeMethodLabel,
    /// Required check never reported on the head commit
    CheckMissing(String),
    /// Required check concluded with something other than success
    CheckNotSuccessful {
        /// Check name
        name: String,
        /// Its conclusion, None while still running
        conclusion: Option<String>,
    },
    /// Not enough approving reviews
    InsufficientApprovals {
        /// Configured minimum
        required: u32,
        /// Approved reviews found
        approved: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen(state) => write!(f, "state is {state}"),
            Self::AlreadyMerged => write!(f, "already merged"),
            Self::Fork => write!(f, "PR is from a fork and fork merging is disabled"),
            Self::BlockingLabel(label) => write!(f, "blocking label present: {label}"),
            Self::MissingLabel(label) => write!(f, "required label missing: {label}"),
            Self::AuthorMismatch { author, expected } => {
                write!(f, "author {author} does not match filter {expected}")
            }
            Self::NoMergeMethodLabel => write!(f, "no merge method label present"),
            Self::CheckMissing(name) => write!(f, "required check {name} has not run"),
            Self::CheckNotSuccessful { name, conclusion } => write!(
                f,
                "required check {name} is {}",
                conclusion.as_deref().unwrap_or("still running")
            ),
            Self::InsufficientApprovals { required, approved } => {
                write!(f, "{approved} of {required} required approvals")
            }
        }
    }
}

/// Find the first required check that is not green.
///
/// Names are matched case-sensitively. When a check reported more than once,
/// the first run listed (the most recent) decides.
pub fn evaluate_required_checks<S: AsRef<str>>(
    required: &[S],
    runs: &[CheckRun],
) -> Option<SkipReason> {
    required.iter().find_map(|name| {
        let name = name.as_ref();
        match runs.iter().find(|run| run.name == name) {
            None => Some(SkipReason::CheckMissing(name.to_string())),
            Some(run) if run.is_success() => None,
            Some(run) => Some(SkipReason::CheckNotSuccessful {
                name: name.to_string(),
                conclusion: run.conclusion.clone(),
            }),
        }
    })
}

/// Count approving reviews.
///
/// Every approved entry counts, including ones from reviewers who later
/// requested changes.
pub fn count_approvals(reviews: &[Review]) -> usize {
    reviews
        .iter()
        .filter(|r| r.state == ReviewState::Approved)
        .count()
}

/// Checks that need nothing but the PR snapshot and the policy
fn evaluate_local(ctx: &MergeContext<'_>, pr: &PullRequest) -> Option<SkipReason> {
    let config = ctx.config;

    if pr.state != PrState::Open {
        return Some(SkipReason::NotOpen(pr.state));
    }
    if pr.merged {
        return Some(SkipReason::AlreadyMerged);
    }
    if pr.is_fork() && !config.merge_forks {
        return Some(SkipReason::Fork);
    }

    let labels = config.label_policy();
    if let Some(label) = labels.blocking.iter().find(|l| pr.has_label(l)) {
        return Some(SkipReason::BlockingLabel(label.clone()));
    }
    if let Some(label) = labels.required.iter().find(|l| !pr.has_label(l)) {
        return Some(SkipReason::MissingLabel(label.clone()));
    }
    debug!(pr_number = pr.number, labels = ?pr.labels, "label policy satisfied");

    if let Some(expected) = &config.filter_author
        && pr.author != *expected
    {
        return Some(SkipReason::AuthorMismatch {
            author: pr.author.clone(),
            expected: expected.clone(),
        });
    }

    if config.merge_method_label_required && config.method_label(&pr.labels).is_none() {
        return Some(SkipReason::NoMergeMethodLabel);
    }

    None
}

/// Decide whether a PR must be skipped.
///
/// Check runs and reviews are only fetched when the policy asks for them.
pub async fn evaluate_skip(
    ctx: &MergeContext<'_>,
    pr: &PullRequest,
) -> Result<Option<SkipReason>> {
    if let Some(reason) = evaluate_local(ctx, pr) {
        return Ok(Some(reason));
    }

    if !ctx.config.required_checks.is_empty() {
        let runs = ctx
            .call(ctx.platform.list_check_runs(&pr.head.sha))
            .await?;
        if let Some(reason) = evaluate_required_checks(&ctx.config.required_checks, &runs) {
            return Ok(Some(reason));
        }
        debug!(pr_number = pr.number, "required checks passed");
    }

    if ctx.config.required_approvals > 0 {
        let reviews = ctx.call(ctx.platform.list_reviews(pr.number)).await?;
        let approved = count_approvals(&reviews);
        debug!(pr_number = pr.number, approved, "counted approvals");
        if approved < ctx.config.required_approvals as usize {
            return Ok(Some(SkipReason::InsufficientApprovals {
                required: ctx.config.required_approvals,
                approved,
            }));
        }
    }

    Ok(None)
}

/// Whether a PR must be skipped
pub async fn should_skip(ctx: &MergeContext<'_>, pr: &PullRequest) -> Result<bool> {
    Ok(evaluate_skip(ctx, pr).await?.is_some())
}
