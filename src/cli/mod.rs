//! CLI plumbing for the `ryu-automerge` binary

pub mod run;
pub mod style;

use anstream::{eprintln, println};
use async_trait::async_trait;
use ryu_automerge::progress::ProgressCallback;
use style::{ARROW, Stylize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Progress printer for the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct CliProgress;

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        println!("{} {message}", ARROW.muted());
    }

    async fn on_warning(&self, message: &str) {
        eprintln!("{} {}", "warning:".warn(), message);
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "ryu_automerge=info",
        2 => "ryu_automerge=debug",
        _ => "ryu_automerge=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
