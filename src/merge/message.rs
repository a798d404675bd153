//! Commit message composition

use crate::config::{CommitMessageMode, build_extraction_regex};
use crate::error::{Error, Result};
use crate::types::PullRequest;

const NUMBER_PLACEHOLDER: &str = "{pullRequest.number}";
const TITLE_PLACEHOLDER: &str = "{pullRequest.title}";
const BODY_PLACEHOLDER: &str = "{pullRequest.body}";

/// Build the merge commit message for a PR.
///
/// `None` means "let the platform choose".
pub fn compose_commit_message(mode: &CommitMessageMode, pr: &PullRequest) -> Option<String> {
    match mode {
        CommitMessageMode::Automatic => None,
        CommitMessageMode::PullRequestTitle => Some(pr.title.clone()),
        CommitMessageMode::PullRequestDescription => Some(pr.body.clone()),
        CommitMessageMode::PullRequestTitleAndDescription => {
            Some(format!("{}\n\n{}", pr.title, pr.body))
        }
        CommitMessageMode::Template(template) => Some(
            template
                .replace(NUMBER_PLACEHOLDER, &pr.number.to_string())
                .replace(TITLE_PLACEHOLDER, &pr.title)
                .replace(BODY_PLACEHOLDER, &pr.body),
        ),
    }
}

/// Replace the PR body with the first capturing group of `pattern`.
///
/// Leaves the body untouched when the pattern does not match. A pattern that
/// matches but has no capturing group is a configuration error. Returns
/// whether the body was rewritten.
pub fn apply_extraction_pattern(pattern: &str, pr: &mut PullRequest) -> Result<bool> {
    let regex = build_extraction_regex(pattern)?;

    let Some(captures) = regex.captures(&pr.body) else {
        return Ok(false);
    };
    if captures.len() < 2 {
        return Err(Error::Config(format!(
            "commit_message_regex must contain a capturing group: {pattern}"
        )));
    }

    let extracted = captures
        .get(1)
        .map_or("", |m| m.as_str())
        .trim()
        .to_string();
    pr.body = extracted;
    Ok(true)
}

/// Split a composed message into commit title (first line) and body.
///
/// Blank parts become `None`.
pub fn split_commit_message(message: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(message) = message else {
        return (None, None);
    };

    let (title, body) = message.split_once('\n').unwrap_or((message, ""));
    let title = title.trim();
    let body = body.trim();

    (
        (!title.is_empty()).then(|| title.to_string()),
        (!body.is_empty()).then(|| body.to_string()),
    )
}
