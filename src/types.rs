//! Core types for ryu-automerge

use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository a platform service talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

impl RepoSpec {
    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{host}/{}/{}", self.owner, self.repo),
            None => write!(f, "{}/{}", self.owner, self.repo),
        }
    }
}

/// PR state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open
    Open,
    /// PR is closed (merged or not, see `PullRequest::merged`)
    Closed,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Platform-computed mergeability of a PR
///
/// Parsed from the platform's string value. Values the crate does not know
/// about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeableState {
    /// No conflicts, all requirements satisfied
    Clean,
    /// Mergeable, with pre-receive hooks configured
    HasHooks,
    /// Still being computed
    Unknown,
    /// Mergeable, but non-required checks are failing
    Unstable,
    /// Merge conflicts
    Dirty,
    /// PR is a draft
    Draft,
    /// Anything else (`behind`, `blocked`, ...)
    Other(String),
}

impl MergeableState {
    /// The platform's string form
    pub fn as_str(&self) -> &str {
        match self {
            Self::Clean => "clean",
            Self::HasHooks => "has_hooks",
            Self::Unknown => "unknown",
            Self::Unstable => "unstable",
            Self::Dirty => "dirty",
            Self::Draft => "draft",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for MergeableState {
    fn from(s: &str) -> Self {
        match s {
            "clean" => Self::Clean,
            "has_hooks" => Self::HasHooks,
            "unknown" => Self::Unknown,
            "unstable" => Self::Unstable,
            "dirty" => Self::Dirty,
            "draft" => Self::Draft,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MergeableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side (head or base) of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Full name (`owner/repo`) of the repository; None if it was deleted
    pub repo: Option<String>,
    /// Branch name
    pub ref_name: String,
    /// Commit the branch points to
    pub sha: String,
}

/// Snapshot of a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR body (empty if none); may be rewritten by commit message extraction
    pub body: String,
    /// Open or closed
    pub state: PrState,
    /// Whether the PR has been merged
    pub merged: bool,
    /// Mergeability, None if the platform did not report one
    pub mergeable_state: Option<MergeableState>,
    /// Source branch
    pub head: GitRef,
    /// Target branch
    pub base: GitRef,
    /// Login of the PR author
    pub author: String,
    /// Label names
    pub labels: Vec<String>,
    /// Web URL for the PR
    pub html_url: String,
}

impl PullRequest {
    /// Whether the head branch lives in a different repository than the base
    pub fn is_fork(&self) -> bool {
        self.head.repo != self.base.repo
    }

    /// Whether the PR carries the given label
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

/// Review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    /// Approved
    Approved,
    /// Changes requested
    ChangesRequested,
    /// Comment only
    Commented,
    /// Dismissed
    Dismissed,
    /// Not submitted yet
    Pending,
    /// Anything else
    Other,
}

/// A review on a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer login, if known
    pub author: Option<String>,
    /// Review state
    pub state: ReviewState,
}

/// Conclusion reported by a successful check run
pub const CHECK_SUCCESS: &str = "success";

/// A check run attached to a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    /// Check name (case-sensitive)
    pub name: String,
    /// `queued`, `in_progress` or `completed`
    pub status: Option<String>,
    /// Conclusion once completed
    pub conclusion: Option<String>,
}

impl CheckRun {
    /// Whether this run concluded successfully
    pub fn is_success(&self) -> bool {
        self.conclusion.as_deref() == Some(CHECK_SUCCESS)
    }
}

/// A branch as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Whether branch protection is enabled
    pub protected: bool,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Squash => write!(f, "squash"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// Everything needed to issue one merge call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// PR number
    pub number: u64,
    /// Head commit the merge is pinned to
    pub sha: String,
    /// Merge method
    pub method: MergeMethod,
    /// Commit title override (None lets the platform choose)
    pub commit_title: Option<String>,
    /// Commit message override
    pub commit_message: Option<String>,
}
