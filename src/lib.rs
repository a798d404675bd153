//! ryu-automerge: merge GitHub pull requests once they satisfy a policy
//!
//! The core is a readiness-polling and merge-retry state machine:
//! - decide whether a PR must be skipped (labels, forks, checks, reviews)
//! - poll until GitHub reports a mergeable state
//! - merge, retrying transient failures
//! - clean up labels and the head branch
//!
//! Remote access goes through [`platform::PlatformService`], so the flow can
//! run against GitHub or a test double.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod progress;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use merge::{MergeContext, merge_pull_request};
