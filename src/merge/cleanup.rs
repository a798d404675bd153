//! Best-effort cleanup after a successful merge
//!
//! Failures here are reported and swallowed: the PR is merged either way.
//! Only cancellation is propagated.

use crate::error::{Error, Result};
use crate::merge::MergeContext;
use crate::types::PullRequest;
use tracing::debug;

/// Labels on the PR that the policy wants removed after merging
pub fn labels_to_remove<'a>(pr_labels: &'a [String], remove: &[String]) -> Vec<&'a str> {
    pr_labels
        .iter()
        .filter(|label| remove.contains(label))
        .map(String::as_str)
        .collect()
}

/// Remove the configured labels from a merged PR
pub async fn remove_labels(ctx: &MergeContext<'_>, pr: &PullRequest) -> Result<()> {
    let labels = labels_to_remove(&pr.labels, &ctx.config.remove_labels);
    if labels.is_empty() {
        debug!(pr_number = pr.number, "no labels to remove");
        return Ok(());
    }

    for label in labels {
        match ctx.call(ctx.platform.remove_label(pr.number, label)).await {
            Ok(()) => {
                ctx.progress
                    .on_message(&format!("Removed label {label} from PR #{}", pr.number))
                    .await;
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                ctx.progress
                    .on_warning(&format!(
                        "Failed to remove label {label} from PR #{}: {e}",
                        pr.number
                    ))
                    .await;
            }
        }
    }
    Ok(())
}

async fn delete_unprotected(ctx: &MergeContext<'_>, branch: &str) -> Result<bool> {
    let info = ctx.call(ctx.platform.get_branch(branch)).await?;
    if info.protected {
        ctx.progress
            .on_message(&format!("Not deleting {branch}: branch is protected"))
            .await;
        return Ok(false);
    }
    ctx.call(ctx.platform.delete_branch(branch)).await?;
    Ok(true)
}

/// Delete the head branch of a merged PR.
///
/// Never touches a fork's branch, filtered branches or protected branches.
/// Returns whether the branch was deleted.
pub async fn delete_branch(ctx: &MergeContext<'_>, pr: &PullRequest) -> Result<bool> {
    let branch = &pr.head.ref_name;

    if !ctx.config.delete_branch {
        return Ok(false);
    }
    if pr.is_fork() {
        ctx.progress
            .on_message(&format!("Not deleting {branch}: PR #{} is from a fork", pr.number))
            .await;
        return Ok(false);
    }
    if ctx.config.delete_branch_filter.contains(branch) {
        ctx.progress
            .on_message(&format!("Not deleting {branch}: branch is filtered"))
            .await;
        return Ok(false);
    }

    match delete_unprotected(ctx, branch).await {
        Ok(true) => {
            ctx.progress
                .on_message(&format!("Deleted branch {branch}"))
                .await;
            Ok(true)
        }
        Ok(false) => Ok(false),
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            ctx.progress
                .on_warning(&format!("Failed to delete branch {branch}: {e}"))
                .await;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_labels_to_remove_is_intersection() {
        let pr_labels = strings(&["automerge", "bug", "ready"]);
        let remove = strings(&["ready", "automerge", "not-present"]);
        assert_eq!(labels_to_remove(&pr_labels, &remove), vec!["automerge", "ready"]);
    }

    #[test]
    fn test_labels_to_remove_empty_policy() {
        let pr_labels = strings(&["automerge"]);
        assert!(labels_to_remove(&pr_labels, &[]).is_empty());
    }
}
