use std::io::IsTerminal;

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

/// Log level used when `RUST_LOG` is not set.
///
/// Priority: quiet flag > verbose count / debug flag > default (info).
pub(crate) fn default_log_level(quiet: bool, verbose: u8, debug: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match (verbose, debug) {
        (0, false) => "info",
        (0 | 1, _) => "debug",
        _ => "trace",
    }
}

pub(crate) fn should_use_progress(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

pub(crate) fn progress_enabled(quiet: bool) -> bool {
    should_use_progress(std::io::stderr().is_terminal(), quiet, is_dumb_terminal())
}

pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .try_init();
}
