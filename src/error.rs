//! Error types for ryu-automerge

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while evaluating or merging a pull request
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API returned an error we mapped to a message
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Raw octocrab error
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Raw HTTP request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Policy configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Repository could not be parsed
    #[error("invalid repository: {0}")]
    InvalidRepo(String),

    /// PR was skipped and the policy asks for skips to be fatal
    #[error("pull request #{number} was skipped: {reason}")]
    Skipped {
        /// PR number
        number: u64,
        /// Why it was skipped
        reason: String,
    },

    /// Cancellation token fired (timeout or interrupt)
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error must abort the merge flow.
    ///
    /// Everything else is reported and degrades to a "not merged" outcome.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Skipped { .. } | Self::Cancelled
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
