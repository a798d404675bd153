//! Platform services
//!
//! The merge flow only talks to the hosting platform through
//! `PlatformService`, which keeps the state machine testable against a
//! scripted fake.

mod detection;
mod github;

pub use detection::parse_repo_spec;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{Branch, CheckRun, MergeRequest, PullRequest, RepoSpec, Review};
use async_trait::async_trait;

/// Remote capabilities needed to evaluate and merge a pull request
///
/// A service is bound to one (base) repository.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Fetch a fresh snapshot of a PR
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest>;

    /// List check runs reported for a commit
    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>>;

    /// List reviews submitted on a PR
    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>>;

    /// Merge a PR
    ///
    /// Errors carry the platform's message text, which callers inspect to
    /// tell terminal failures from transient ones.
    async fn merge_pull_request(&self, request: &MergeRequest) -> Result<()>;

    /// Remove a label from a PR
    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()>;

    /// Fetch a branch by name
    async fn get_branch(&self, name: &str) -> Result<Branch>;

    /// Delete a branch (its `heads/` reference)
    async fn delete_branch(&self, name: &str) -> Result<()>;

    /// Repository this service is bound to
    fn config(&self) -> &RepoSpec;
}
