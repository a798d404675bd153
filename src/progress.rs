//! Progress reporting for merge flows
//!
//! The merge components narrate their decisions through a `ProgressCallback`
//! handed to them by the caller, so the CLI, tests and library users can each
//! decide where the narration goes.

use async_trait::async_trait;

/// Sink for human-readable progress messages
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Informational message (decision points, attempts, outcomes)
    async fn on_message(&self, message: &str);

    /// Something went wrong but the flow carries on
    async fn on_warning(&self, message: &str);
}

/// Forwards progress to `tracing` at info/warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

#[async_trait]
impl ProgressCallback for TracingProgress {
    async fn on_message(&self, message: &str) {
        tracing::info!("{message}");
    }

    async fn on_warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}

    async fn on_warning(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sinks_are_object_safe() {
        let sinks: [&dyn ProgressCallback; 2] = [&TracingProgress, &NoopProgress];
        for sink in sinks {
            sink.on_message("checking PR #1").await;
            sink.on_warning("PR #1 not merged").await;
        }
    }
}
