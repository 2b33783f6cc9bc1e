//! CLI entry point for the playlist backup tool.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

mod app;
mod cli;
mod commands;

use cli::Args;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every playlist was processed.
    Success,
    /// A fatal error stopped the run.
    Failure,
    /// A signal stopped the run early; completed files are intact.
    Canceled,
}

impl ProcessExit {
    /// Numeric process exit code.
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Canceled => 130,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    app::terminal::init_tracing(app::terminal::default_log_level(
        args.quiet,
        args.verbose,
        args.debug,
    ));
    debug!(?args, "CLI arguments parsed");

    match app::runtime::run_backup(&args).await {
        Ok(exit) => exit.into(),
        Err(err) => {
            error!("{err:#}");
            ProcessExit::Failure.into()
        }
    }
}
