//! Run the merge flow for every PR given on the command line

use crate::cli::CliProgress;
use crate::cli::style::{CHECK, CROSS, Stylize};
use anstream::println;
use ryu_automerge::auth::get_github_auth;
use ryu_automerge::config::Config;
use ryu_automerge::error::{Error, Result};
use ryu_automerge::merge::{MergeContext, merge_pull_request};
use ryu_automerge::platform::{GitHubService, parse_repo_spec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// `owner/repo` or a repository URL
    pub repo: String,
    /// Policy file; defaults apply when absent
    pub config: Option<PathBuf>,
    /// GitHub Enterprise host, overrides the one in `repo`
    pub host: Option<String>,
    /// Give up after this long
    pub timeout: Option<Duration>,
    /// PR numbers
    pub prs: Vec<u64>,
}

/// What happened to one PR
#[derive(Debug)]
pub enum PrOutcome {
    /// Merged by this run
    Merged,
    /// Skipped, never ready or not mergeable
    NotMerged,
    /// Fatal error
    Failed(String),
}

/// Per-PR outcomes, in PR order
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Outcome per PR number
    pub outcomes: Vec<(u64, PrOutcome)>,
}

impl RunSummary {
    /// Whether any PR hit a fatal error
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, PrOutcome::Failed(_)))
    }
}

/// Cancel `token` on Ctrl-C or when `timeout` elapses
fn spawn_cancellers(token: &CancellationToken, timeout: Option<Duration>) {
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let on_deadline = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = on_deadline.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    warn!(timeout_secs = timeout.as_secs(), "timed out, cancelling");
                    on_deadline.cancel();
                }
            }
        });
    }
}

/// Run the merge flow for all requested PRs concurrently
pub async fn run_automerge(options: RunOptions) -> Result<RunSummary> {
    let mut repo = parse_repo_spec(&options.repo)?;
    if let Some(host) = options.host {
        repo.host = (host != "github.com").then_some(host);
    }

    let config = match &options.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let auth = get_github_auth(repo.host.as_deref()).await?;
    debug!(source = ?auth.source, "authenticated");

    println!(
        "{} {}",
        "Repository".emphasis(),
        repo.to_string().accent()
    );

    let platform = Arc::new(GitHubService::new(&auth.token, repo)?);
    let config = Arc::new(config);
    let cancel = CancellationToken::new();
    spawn_cancellers(&cancel, options.timeout);

    let mut tasks = JoinSet::new();
    for pr_number in options.prs.iter().copied() {
        let platform = Arc::clone(&platform);
        let config = Arc::clone(&config);
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let progress = CliProgress;
            let ctx = MergeContext::new(platform.as_ref(), &config, &progress, cancel);
            (pr_number, merge_pull_request(&ctx, pr_number).await)
        });
    }

    let mut summary = RunSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((pr_number, Ok(true))) => summary.outcomes.push((pr_number, PrOutcome::Merged)),
            Ok((pr_number, Ok(false))) => {
                summary.outcomes.push((pr_number, PrOutcome::NotMerged));
            }
            Ok((pr_number, Err(e))) => {
                if matches!(e, Error::Cancelled) {
                    cancel.cancel();
                }
                summary
                    .outcomes
                    .push((pr_number, PrOutcome::Failed(e.to_string())));
            }
            Err(e) => {
                warn!(error = %e, "merge task panicked");
                return Err(Error::Io(std::io::Error::other(e)));
            }
        }
    }
    cancel.cancel();

    summary.outcomes.sort_by_key(|(pr_number, _)| *pr_number);
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!();
    for (pr_number, outcome) in &summary.outcomes {
        let pr = format!("#{pr_number}");
        match outcome {
            PrOutcome::Merged => {
                println!("{} {} merged", CHECK.success(), pr.accent());
            }
            PrOutcome::NotMerged => {
                println!("{} {} {}", "-".muted(), pr.accent(), "not merged".muted());
            }
            PrOutcome::Failed(message) => {
                println!("{} {} {}", CROSS.error(), pr.accent(), message.error());
            }
        }
    }
}
