//! ryu-automerge CLI

mod cli;

use anstream::eprintln;
use anyhow::Result;
use clap::Parser;
use cli::run::{RunOptions, run_automerge};
use cli::style::Stylize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Merge GitHub pull requests once they satisfy a readiness policy
#[derive(Parser, Debug)]
#[command(name = "ryu-automerge", version, about)]
struct Args {
    /// Repository as owner/repo or URL
    #[arg(long, short)]
    repo: String,

    /// Policy file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// GitHub Enterprise host
    #[arg(long)]
    host: Option<String>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pull request numbers
    #[arg(required = true)]
    prs: Vec<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    cli::init_logging(args.verbose);

    let options = RunOptions {
        repo: args.repo,
        config: args.config,
        host: args.host,
        timeout: args.timeout.map(Duration::from_secs),
        prs: args.prs,
    };

    match run_automerge(options).await {
        Ok(summary) if summary.has_failures() => Ok(ExitCode::FAILURE),
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{} {e}", "error:".error());
            Ok(ExitCode::FAILURE)
        }
    }
}
