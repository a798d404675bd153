//! Merge policy configuration
//!
//! The policy is read once per invocation from a TOML file and is read-only
//! afterwards. Every key is optional; missing keys take the defaults below.

use crate::error::{Error, Result};
use crate::merge::RetryRunner;
use crate::types::MergeMethod;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default states treated as "probably mergeable"
pub const DEFAULT_READY_STATES: [&str; 4] = ["clean", "has_hooks", "unknown", "unstable"];

/// How the merge commit message is produced
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommitMessageMode {
    /// Let the platform pick its default message
    #[default]
    Automatic,
    /// PR title verbatim
    PullRequestTitle,
    /// PR body verbatim
    PullRequestDescription,
    /// Title, blank line, body
    PullRequestTitleAndDescription,
    /// Anything else: a template with `{pullRequest.*}` placeholders
    Template(String),
}

impl From<&str> for CommitMessageMode {
    fn from(s: &str) -> Self {
        match s {
            "automatic" => Self::Automatic,
            "pull-request-title" => Self::PullRequestTitle,
            "pull-request-description" => Self::PullRequestDescription,
            "pull-request-title-and-description" => Self::PullRequestTitleAndDescription,
            template => Self::Template(template.to_string()),
        }
    }
}

impl From<String> for CommitMessageMode {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl FromStr for CommitMessageMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for CommitMessageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::PullRequestTitle => write!(f, "pull-request-title"),
            Self::PullRequestDescription => write!(f, "pull-request-description"),
            Self::PullRequestTitleAndDescription => {
                write!(f, "pull-request-title-and-description")
            }
            Self::Template(t) => f.write_str(t),
        }
    }
}

impl From<CommitMessageMode> for String {
    fn from(mode: CommitMessageMode) -> Self {
        mode.to_string()
    }
}

/// Required and blocking label sets
///
/// Parsed from a single list where a leading `!` marks a blocking label:
/// `["automerge", "!wip"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPolicy {
    /// Every one of these must be present
    pub required: Vec<String>,
    /// None of these may be present
    pub blocking: Vec<String>,
}

impl LabelPolicy {
    /// Split a label list into required and blocking sets.
    ///
    /// Blank entries are ignored.
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut policy = Self::default();
        for label in labels {
            let label = label.as_ref().trim();
            if let Some(blocking) = label.strip_prefix('!') {
                let blocking = blocking.trim();
                if !blocking.is_empty() {
                    policy.blocking.push(blocking.to_string());
                }
            } else if !label.is_empty() {
                policy.required.push(label.to_string());
            }
        }
        policy
    }
}

/// Merge policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Required labels, `!`-prefixed entries are blocking
    pub labels: Vec<String>,
    /// Labels stripped from the PR after a successful merge
    pub remove_labels: Vec<String>,
    /// Whether PRs from forks may be merged
    pub merge_forks: bool,
    /// Check runs that must have concluded with `success`
    pub required_checks: Vec<String>,
    /// Minimum number of approving reviews
    pub required_approvals: u32,
    /// Default merge method
    pub merge_method: MergeMethod,
    /// Label name to merge method overrides
    pub merge_method_labels: BTreeMap<String, MergeMethod>,
    /// Skip PRs that carry none of the `merge_method_labels`
    pub merge_method_label_required: bool,
    /// Commit message mode or template
    pub commit_message: CommitMessageMode,
    /// Pattern whose first capturing group replaces the PR body
    pub commit_message_regex: Option<String>,
    /// Only merge PRs opened by this login
    pub filter_author: Option<String>,
    /// Delete the head branch after merging
    pub delete_branch: bool,
    /// Branches never deleted
    pub delete_branch_filter: Vec<String>,
    /// Follow-up attempts after the first readiness/merge attempt
    pub retries: u32,
    /// Sleep between attempts, in milliseconds
    pub retry_sleep_ms: u64,
    /// Mergeable states treated as "probably ready"
    pub ready_states: Vec<String>,
    /// Fail instead of returning quietly when a PR is skipped
    pub fail_on_skip: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            labels: vec!["automerge".to_string()],
            remove_labels: Vec::new(),
            merge_forks: true,
            required_checks: Vec::new(),
            required_approvals: 0,
            merge_method: MergeMethod::Merge,
            merge_method_labels: BTreeMap::new(),
            merge_method_label_required: false,
            commit_message: CommitMessageMode::Automatic,
            commit_message_regex: None,
            filter_author: None,
            delete_branch: false,
            delete_branch_filter: Vec::new(),
            retries: 6,
            retry_sleep_ms: 5000,
            ready_states: DEFAULT_READY_STATES.iter().map(ToString::to_string).collect(),
            fail_on_skip: false,
        }
    }
}

impl Config {
    /// Parse and validate a TOML policy
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML policy file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject policies that can never work.
    ///
    /// The extraction pattern is compiled here so syntax errors surface before
    /// any PR is touched; a missing capturing group is only reported when the
    /// pattern actually matches.
    pub fn validate(&self) -> Result<()> {
        if let Some(pattern) = &self.commit_message_regex {
            build_extraction_regex(pattern)?;
        }
        if self.merge_method_label_required && self.merge_method_labels.is_empty() {
            return Err(Error::Config(
                "merge_method_label_required is set but merge_method_labels is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Required/blocking label sets
    pub fn label_policy(&self) -> LabelPolicy {
        LabelPolicy::parse(&self.labels)
    }

    /// Sleep between attempts
    pub const fn retry_sleep(&self) -> Duration {
        Duration::from_millis(self.retry_sleep_ms)
    }

    /// Retry runner shared by readiness polling and merging
    pub const fn retry_runner(&self) -> RetryRunner {
        RetryRunner::new(self.retries, self.retry_sleep())
    }

    /// Merge method label found on the PR, if any
    pub fn method_label<'a>(&self, labels: &'a [String]) -> Option<(&'a str, MergeMethod)> {
        labels.iter().find_map(|label| {
            self.merge_method_labels
                .get(label)
                .map(|method| (label.as_str(), *method))
        })
    }

    /// Merge method for a PR with the given labels
    pub fn merge_method_for(&self, labels: &[String]) -> MergeMethod {
        self.method_label(labels)
            .map_or(self.merge_method, |(_, method)| method)
    }
}

/// Compile a commit message extraction pattern.
///
/// Case-insensitive, `^`/`$` match at line boundaries and `.` matches
/// newlines.
pub fn build_extraction_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| Error::Config(format!("invalid commit_message_regex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.label_policy().required, vec!["automerge"]);
        assert!(config.merge_forks);
        assert_eq!(config.retries, 6);
        assert_eq!(config.retry_sleep(), Duration::from_secs(5));
        assert_eq!(config.commit_message, CommitMessageMode::Automatic);
        assert_eq!(config.ready_states, DEFAULT_READY_STATES);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_full_toml() {
        let config = Config::from_toml_str(
            r#"
            labels = ["automerge", "!wip", "!do not merge"]
            remove_labels = ["automerge"]
            merge_forks = false
            required_checks = ["build", "lint"]
            required_approvals = 2
            merge_method = "squash"
            merge_method_labels = { "rebase-me" = "rebase" }
            commit_message = "pull-request-title-and-description"
            commit_message_regex = "^## Summary\\s*(.*?)^##"
            filter_author = "octocat"
            delete_branch = true
            delete_branch_filter = ["develop"]
            retries = 3
            retry_sleep_ms = 100
            fail_on_skip = true
            "#,
        )
        .unwrap();

        let labels = config.label_policy();
        assert_eq!(labels.required, vec!["automerge"]);
        assert_eq!(labels.blocking, vec!["wip", "do not merge"]);
        assert!(!config.merge_forks);
        assert_eq!(config.required_approvals, 2);
        assert_eq!(config.merge_method, MergeMethod::Squash);
        assert_eq!(
            config.commit_message,
            CommitMessageMode::PullRequestTitleAndDescription
        );
        assert_eq!(config.filter_author.as_deref(), Some("octocat"));
        assert_eq!(config.retry_sleep(), Duration::from_millis(100));
        assert!(config.fail_on_skip);
    }

    #[test]
    fn test_template_commit_message() {
        let config =
            Config::from_toml_str(r#"commit_message = "PR #{pullRequest.number}""#).unwrap();
        assert_eq!(
            config.commit_message,
            CommitMessageMode::Template("PR #{pullRequest.number}".to_string())
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("merge_labels = []").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = Config::from_toml_str(r#"commit_message_regex = "(unclosed""#).unwrap_err();
        assert!(err.to_string().contains("commit_message_regex"));
    }

    #[test]
    fn test_method_label_required_needs_labels() {
        let err = Config::from_toml_str("merge_method_label_required = true").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_merge_method_for_labels() {
        let config = Config::from_toml_str(
            r#"
            merge_method = "merge"
            merge_method_labels = { "squash" = "squash" }
            "#,
        )
        .unwrap();
        assert_eq!(
            config.merge_method_for(&["squash".to_string()]),
            MergeMethod::Squash
        );
        assert_eq!(
            config.merge_method_for(&["other".to_string()]),
            MergeMethod::Merge
        );
    }

    #[test]
    fn test_label_policy_ignores_blank_entries() {
        let policy = LabelPolicy::parse(&["", " ! ", " ready "]);
        assert_eq!(policy.required, vec!["ready"]);
        assert!(policy.blocking.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("automerge.toml");
        fs::write(&path, "retries = 1\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.retries, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
