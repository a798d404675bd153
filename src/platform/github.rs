//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    Branch, CheckRun, GitRef, MergeMethod, MergeRequest, MergeableState, PrState, PullRequest,
    RepoSpec, Review, ReviewState,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

const GITHUB_API: &str = "https://api.github.com";
const CHECK_RUNS_PER_PAGE: &str = "100";

/// Percent-encode a branch name for use in a URL path, keeping `/` as the
/// separator (`release#42` must not turn into a fragment)
fn encode_branch(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// GitHub service using octocrab, with raw HTTP for the endpoints octocrab
/// does not cover conveniently (check runs, branches, refs)
pub struct GitHubService {
    client: Octocrab,
    config: RepoSpec,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API base URL for raw requests, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service for a repository
    ///
    /// github.com is used unless the repository names another host, in which case
    /// the GitHub Enterprise `/api/v3` endpoint of that host is used.
    pub fn new(token: &str, config: RepoSpec) -> Result<Self> {
        let api_base = config
            .host
            .as_ref()
            .map_or_else(|| GITHUB_API.to_string(), |h| format!("https://{h}/api/v3"));
        Self::with_api_base(token, config, &api_base)
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_base(token: &str, config: RepoSpec, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(&api_base)
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("ryu-automerge")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Turn a non-success response into an error carrying GitHub's message
    async fn error_from_response(response: reqwest::Response, what: &str) -> Error {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
        }

        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .map_or_else(|_| status.to_string(), |b| b.message);
        Error::GitHubApi(format!("{what} ({status}): {message}"))
    }
}

/// GitHub's message text for an octocrab error, when it has one
fn octocrab_message(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => source.message.clone(),
        other => other.to_string(),
    }
}

/// Helper to convert an octocrab ref to our `GitRef`
fn git_ref(
    repo: Option<&octocrab::models::Repository>,
    ref_name: &str,
    sha: &str,
) -> GitRef {
    GitRef {
        repo: repo.and_then(|r| r.full_name.clone()),
        ref_name: ref_name.to_string(),
        sha: sha.to_string(),
    }
}

/// Helper to convert an octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
        Some(_) | None => PrState::Closed,
    };

    // Round-trip through serde to get GitHub's string form, so states octocrab
    // does not model still end up as `Other`
    let mergeable_state = pr
        .mergeable_state
        .as_ref()
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| v.as_str().map(MergeableState::from));

    PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        body: pr.body.clone().unwrap_or_default(),
        state,
        merged: pr.merged.unwrap_or(false) || pr.merged_at.is_some(),
        mergeable_state,
        head: git_ref(pr.head.repo.as_ref(), &pr.head.ref_field, &pr.head.sha),
        base: git_ref(pr.base.repo.as_ref(), &pr.base.ref_field, &pr.base.sha),
        author: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_default(),
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(pr_number, "getting PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await?;

        let result = pr_from_octocrab(&pr);
        debug!(
            pr_number,
            state = %result.state,
            merged = result.merged,
            mergeable_state = ?result.mergeable_state,
            "got PR"
        );
        Ok(result)
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            total_count: usize,
            check_runs: Vec<RawCheckRun>,
        }

        #[derive(Deserialize)]
        struct RawCheckRun {
            name: String,
            status: Option<String>,
            conclusion: Option<String>,
        }

        debug!(sha, "listing check runs");
        let url = self.repo_url(&format!("commits/{sha}/check-runs"));
        let mut runs: Vec<CheckRun> = Vec::new();

        for page in 1_u32.. {
            let page_param = page.to_string();
            let response = self
                .authorized(self.http_client.get(&url))
                .query(&[("per_page", CHECK_RUNS_PER_PAGE), ("page", page_param.as_str())])
                .send()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to fetch check runs: {e}")))?;

            if !response.status().is_success() {
                return Err(
                    Self::error_from_response(response, "Failed to fetch check runs").await,
                );
            }

            let body: CheckRunsResponse = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

            let fetched = body.check_runs.len();
            runs.extend(body.check_runs.into_iter().map(|r| CheckRun {
                name: r.name,
                status: r.status,
                conclusion: r.conclusion,
            }));

            if fetched == 0 || runs.len() >= body.total_count {
                break;
            }
            debug!(sha, page, fetched = runs.len(), total = body.total_count, "fetching next page");
        }

        debug!(sha, count = runs.len(), "listed check runs");
        Ok(runs)
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        use octocrab::models::pulls::ReviewState as OctoReviewState;

        debug!(pr_number, "listing reviews");
        let reviews = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list_reviews(pr_number)
            .send()
            .await?;

        let result: Vec<Review> = reviews
            .items
            .into_iter()
            .map(|r| Review {
                author: r.user.map(|u| u.login),
                state: match r.state {
                    Some(OctoReviewState::Approved) => ReviewState::Approved,
                    Some(OctoReviewState::ChangesRequested) => ReviewState::ChangesRequested,
                    Some(OctoReviewState::Commented) => ReviewState::Commented,
                    Some(OctoReviewState::Dismissed) => ReviewState::Dismissed,
                    Some(OctoReviewState::Pending) => ReviewState::Pending,
                    _ => ReviewState::Other,
                },
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed reviews");
        Ok(result)
    }

    async fn merge_pull_request(&self, request: &MergeRequest) -> Result<()> {
        let pr_number = request.number;
        debug!(pr_number, method = %request.method, sha = %request.sha, "merging PR");

        let octocrab_method = match request.method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls
            .merge(pr_number)
            .method(octocrab_method)
            .sha(request.sha.clone());
        if let Some(ref title) = request.commit_title {
            builder = builder.title(title.clone());
        }
        if let Some(ref message) = request.commit_message {
            builder = builder.message(message.clone());
        }

        let result = builder
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {}", octocrab_message(&e))))?;

        if !result.merged {
            let message = result.message.unwrap_or_else(|| "not merged".to_string());
            return Err(Error::GitHubApi(format!("Merge failed: {message}")));
        }

        debug!(pr_number, sha = ?result.sha, "merge complete");
        Ok(())
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()> {
        debug!(pr_number, label, "removing label");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .remove_label(pr_number, label)
            .await?;
        debug!(pr_number, label, "removed label");
        Ok(())
    }

    async fn get_branch(&self, name: &str) -> Result<Branch> {
        debug!(branch = name, "getting branch");
        let url = self.repo_url(&format!("branches/{}", encode_branch(name)));
        let response = self
            .authorized(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch branch: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Failed to fetch branch").await);
        }

        let branch: Branch = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse branch: {e}")))?;
        debug!(branch = name, protected = branch.protected, "got branch");
        Ok(branch)
    }

    async fn delete_branch(&self, name: &str) -> Result<()> {
        debug!(branch = name, "deleting branch");
        let url = self.repo_url(&format!("git/refs/heads/{}", encode_branch(name)));
        let response = self
            .authorized(self.http_client.delete(&url))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to delete branch: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Failed to delete branch").await);
        }

        debug!(branch = name, "deleted branch");
        Ok(())
    }

    fn config(&self) -> &RepoSpec {
        &self.config
    }
}
