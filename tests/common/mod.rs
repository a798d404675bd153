//! Shared test helpers

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{MockPlatformService, RemoveLabelCall};

use ryu_automerge::config::Config;
use ryu_automerge::merge::MergeContext;
use ryu_automerge::progress::ProgressCallback;
use ryu_automerge::types::{
    CheckRun, GitRef, MergeableState, PrState, PullRequest, RepoSpec, Review, ReviewState,
};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const REPO: &str = "octo/repo";
pub const HEAD_SHA: &str = "head123";

pub fn repo_spec() -> RepoSpec {
    RepoSpec {
        owner: "octo".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

pub fn mock_platform() -> MockPlatformService {
    MockPlatformService::with_config(repo_spec())
}

/// Open, labelled, clean PR from a branch of the same repository
pub fn make_pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: format!("Change {number}"),
        body: "Body text".to_string(),
        state: PrState::Open,
        merged: false,
        mergeable_state: Some(MergeableState::Clean),
        head: GitRef {
            repo: Some(REPO.to_string()),
            ref_name: format!("feature-{number}"),
            sha: HEAD_SHA.to_string(),
        },
        base: GitRef {
            repo: Some(REPO.to_string()),
            ref_name: "main".to_string(),
            sha: "base456".to_string(),
        },
        author: "octocat".to_string(),
        labels: vec!["automerge".to_string()],
        html_url: format!("https://github.com/{REPO}/pull/{number}"),
    }
}

pub fn with_state(mut pr: PullRequest, state: &str) -> PullRequest {
    pr.mergeable_state = Some(MergeableState::from(state));
    pr
}

pub fn merged(mut pr: PullRequest) -> PullRequest {
    pr.merged = true;
    pr.state = PrState::Closed;
    pr
}

pub fn from_fork(mut pr: PullRequest) -> PullRequest {
    pr.head.repo = Some("someone/repo".to_string());
    pr
}

pub fn check_run(name: &str, conclusion: Option<&str>) -> CheckRun {
    CheckRun {
        name: name.to_string(),
        status: Some(if conclusion.is_some() { "completed" } else { "in_progress" }.to_string()),
        conclusion: conclusion.map(String::from),
    }
}

pub fn approval() -> Review {
    Review {
        author: Some("reviewer".to_string()),
        state: ReviewState::Approved,
    }
}

/// Policy with zero retry sleep, so retry tests run instantly
pub fn fast_config() -> Config {
    Config {
        retry_sleep_ms: 0,
        ..Config::default()
    }
}

/// Records every progress message
#[derive(Default)]
pub struct RecordingProgress {
    messages: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings().iter().any(|m| m.contains(needle))
    }
}

#[async_trait::async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    async fn on_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

pub fn context<'a>(
    platform: &'a MockPlatformService,
    config: &'a Config,
    progress: &'a RecordingProgress,
) -> MergeContext<'a> {
    MergeContext::new(platform, config, progress, CancellationToken::new())
}
