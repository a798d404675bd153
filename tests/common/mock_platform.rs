//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use ryu_automerge::error::{Error, Result};
use ryu_automerge::platform::PlatformService;
use ryu_automerge::types::{Branch, CheckRun, MergeRequest, PullRequest, RepoSpec, Review};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// Call record for `remove_label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLabelCall {
    pub pr_number: u64,
    pub label: String,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// because mockall has issues with methods returning references.
///
/// Features:
/// - Scripted PR snapshots: each `get_pull_request` pops the next one, the
///   last one repeats
/// - Scripted merge results, same queueing rule
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: RepoSpec,
    pr_responses: Mutex<HashMap<u64, VecDeque<Result<PullRequest>>>>,
    check_runs: Mutex<HashMap<String, Vec<CheckRun>>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    merge_results: Mutex<VecDeque<Result<()>>>,
    protected_branches: Mutex<HashSet<String>>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    list_check_runs_calls: Mutex<Vec<String>>,
    list_reviews_calls: Mutex<Vec<u64>>,
    merge_calls: Mutex<Vec<MergeRequest>>,
    remove_label_calls: Mutex<Vec<RemoveLabelCall>>,
    get_branch_calls: Mutex<Vec<String>>,
    delete_branch_calls: Mutex<Vec<String>>,
    // Error injection
    error_on_remove_label: Mutex<Option<String>>,
    error_on_get_branch: Mutex<Option<String>>,
    error_on_delete_branch: Mutex<Option<String>>,
}

/// Copy a scripted result; errors are re-created from their message
fn replay<T: Clone>(result: &Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value.clone()),
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => Err(Error::GitHubApi(e.to_string())),
    }
}

/// Pop the next scripted result, repeating the last one
fn next_scripted<T: Clone>(queue: &mut VecDeque<Result<T>>) -> Option<Result<T>> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().map(replay)
    }
}

impl MockPlatformService {
    /// Create a new mock with the given repository
    pub fn with_config(config: RepoSpec) -> Self {
        Self {
            config,
            pr_responses: Mutex::new(HashMap::new()),
            check_runs: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            merge_results: Mutex::new(VecDeque::new()),
            protected_branches: Mutex::new(HashSet::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            list_check_runs_calls: Mutex::new(Vec::new()),
            list_reviews_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            remove_label_calls: Mutex::new(Vec::new()),
            get_branch_calls: Mutex::new(Vec::new()),
            delete_branch_calls: Mutex::new(Vec::new()),
            error_on_remove_label: Mutex::new(None),
            error_on_get_branch: Mutex::new(None),
            error_on_delete_branch: Mutex::new(None),
        }
    }

    // === Response setup ===

    /// Script the snapshots returned by successive `get_pull_request` calls
    pub fn set_pr_responses(&self, pr_number: u64, snapshots: Vec<PullRequest>) {
        self.pr_responses
            .lock()
            .unwrap()
            .insert(pr_number, snapshots.into_iter().map(Ok).collect());
    }

    /// Always return this snapshot
    pub fn set_pr(&self, pr: PullRequest) {
        self.set_pr_responses(pr.number, vec![pr]);
    }

    /// Queue an error for the next `get_pull_request` call on a PR
    pub fn push_pr_error(&self, pr_number: u64, msg: &str) {
        self.pr_responses
            .lock()
            .unwrap()
            .entry(pr_number)
            .or_default()
            .push_front(Err(Error::GitHubApi(msg.to_string())));
    }

    /// Set check runs for a commit
    pub fn set_check_runs(&self, sha: &str, runs: Vec<CheckRun>) {
        self.check_runs
            .lock()
            .unwrap()
            .insert(sha.to_string(), runs);
    }

    /// Set reviews for a PR
    pub fn set_reviews(&self, pr_number: u64, reviews: Vec<Review>) {
        self.reviews.lock().unwrap().insert(pr_number, reviews);
    }

    /// Script merge results; merges succeed once the script is empty
    pub fn set_merge_results(&self, results: Vec<Result<()>>) {
        *self.merge_results.lock().unwrap() = results.into();
    }

    /// Make every merge call fail with this message
    pub fn fail_merge(&self, msg: &str) {
        self.set_merge_results(vec![Err(Error::GitHubApi(msg.to_string()))]);
    }

    /// Mark a branch as protected
    pub fn protect_branch(&self, name: &str) {
        self.protected_branches
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    // === Error injection methods ===

    /// Make `remove_label` return an error
    pub fn fail_remove_label(&self, msg: &str) {
        *self.error_on_remove_label.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_branch` return an error
    pub fn fail_get_branch(&self, msg: &str) {
        *self.error_on_get_branch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `delete_branch` return an error
    pub fn fail_delete_branch(&self, msg: &str) {
        *self.error_on_delete_branch.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// Get all `get_pull_request` calls
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Get all `list_check_runs` calls
    pub fn get_list_check_runs_calls(&self) -> Vec<String> {
        self.list_check_runs_calls.lock().unwrap().clone()
    }

    /// Get all `list_reviews` calls
    pub fn get_list_reviews_calls(&self) -> Vec<u64> {
        self.list_reviews_calls.lock().unwrap().clone()
    }

    /// Get all merge calls
    pub fn get_merge_calls(&self) -> Vec<MergeRequest> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Get all `remove_label` calls
    pub fn get_remove_label_calls(&self) -> Vec<RemoveLabelCall> {
        self.remove_label_calls.lock().unwrap().clone()
    }

    /// Get all `get_branch` calls
    pub fn get_branch_calls(&self) -> Vec<String> {
        self.get_branch_calls.lock().unwrap().clone()
    }

    /// Get all `delete_branch` calls
    pub fn get_delete_branch_calls(&self) -> Vec<String> {
        self.delete_branch_calls.lock().unwrap().clone()
    }

    /// Assert that a merge was issued for a specific PR
    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.get_merge_calls();
        assert!(
            calls.iter().any(|c| c.number == pr_number),
            "Expected merge({pr_number}) but got: {calls:?}"
        );
    }

    /// Assert that no merge was issued for a specific PR
    pub fn assert_merge_not_called(&self, pr_number: u64) {
        let calls = self.get_merge_calls();
        assert!(
            !calls.iter().any(|c| c.number == pr_number),
            "Expected merge({pr_number}) NOT to be called but it was: {calls:?}"
        );
    }

    /// Assert that no branch was deleted
    pub fn assert_no_branch_deleted(&self) {
        let calls = self.get_delete_branch_calls();
        assert!(calls.is_empty(), "Expected no branch deletion but got: {calls:?}");
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        self.get_pr_calls.lock().unwrap().push(pr_number);
        self.pr_responses
            .lock()
            .unwrap()
            .get_mut(&pr_number)
            .and_then(next_scripted)
            .unwrap_or_else(|| Err(Error::GitHubApi(format!("PR #{pr_number} not found"))))
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        self.list_check_runs_calls
            .lock()
            .unwrap()
            .push(sha.to_string());
        Ok(self
            .check_runs
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        self.list_reviews_calls.lock().unwrap().push(pr_number);
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn merge_pull_request(&self, request: &MergeRequest) -> Result<()> {
        self.merge_calls.lock().unwrap().push(request.clone());
        next_scripted(&mut *self.merge_results.lock().unwrap()).unwrap_or(Ok(()))
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()> {
        self.remove_label_calls.lock().unwrap().push(RemoveLabelCall {
            pr_number,
            label: label.to_string(),
        });
        if let Some(msg) = self.error_on_remove_label.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(())
    }

    async fn get_branch(&self, name: &str) -> Result<Branch> {
        self.get_branch_calls.lock().unwrap().push(name.to_string());
        if let Some(msg) = self.error_on_get_branch.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(Branch {
            name: name.to_string(),
            protected: self.protected_branches.lock().unwrap().contains(name),
        })
    }

    async fn delete_branch(&self, name: &str) -> Result<()> {
        self.delete_branch_calls
            .lock()
            .unwrap()
            .push(name.to_string());
        if let Some(msg) = self.error_on_delete_branch.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(())
    }

    fn config(&self) -> &RepoSpec {
        &self.config
    }
}
