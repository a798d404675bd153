//! GitHub token discovery

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// First non-empty token from `GITHUB_TOKEN` or `GH_TOKEN`
pub fn token_from_env() -> Option<String> {
    token_from_vars(|name| std::env::var(name).ok())
}

fn token_from_vars(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_VARS.iter().find_map(|var| {
        lookup(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

async fn token_from_gh(host: Option<&str>) -> Option<String> {
    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(host) = host {
        cmd.args(["--hostname", host]);
    }

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "gh CLI not available");
            return None;
        }
    };
    if !output.status.success() {
        debug!(status = %output.status, "gh auth token failed");
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Get GitHub authentication
///
/// Priority:
/// 1. `GITHUB_TOKEN` env var
/// 2. `GH_TOKEN` env var
/// 3. `gh auth token` (with `--hostname` for GitHub Enterprise)
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(token) = token_from_env() {
        debug!("using token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    if let Some(token) = token_from_gh(host).await {
        debug!("using token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    Err(Error::Auth(
        "No GitHub token found. Set GITHUB_TOKEN, GH_TOKEN, or run 'gh auth login'".to_string(),
    ))
}
