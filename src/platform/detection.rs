//! Repository detection from user input

use crate::error::{Error, Result};
use crate::types::RepoSpec;
use url::Url;

const GITHUB_HOST: &str = "github.com";

/// Parse a repository given as `owner/repo`, an HTTPS URL or an SSH remote.
///
/// A host other than github.com is kept so the service can target GitHub
/// Enterprise.
pub fn parse_repo_spec(input: &str) -> Result<RepoSpec> {
    let input = input.trim();

    if let Some(rest) = input.strip_prefix("git@") {
        // git@host:owner/repo(.git)
        let (host, path) = rest
            .split_once(':')
            .ok_or_else(|| Error::InvalidRepo(input.to_string()))?;
        return from_parts(Some(host), path, input);
    }

    if input.contains("://") {
        let url = Url::parse(input).map_err(|e| Error::InvalidRepo(format!("{input}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidRepo(input.to_string()))?;
        return from_parts(Some(host), url.path(), input);
    }

    from_parts(None, input, input)
}

fn from_parts(host: Option<&str>, path: &str, input: &str) -> Result<RepoSpec> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let (Some(owner), Some(repo), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(Error::InvalidRepo(format!(
            "{input}: expected owner/repo"
        )));
    };

    let host = host
        .filter(|h| !h.eq_ignore_ascii_case(GITHUB_HOST))
        .map(ToString::to_string);

    Ok(RepoSpec {
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}
