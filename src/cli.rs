//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use playlist_backup::config::DEFAULT_CONFIG_FILE;

/// Back up music service playlists and tracks to local disk.
///
/// Playlist metadata is rewritten on every run; tracks already present in
/// the tracks directory are skipped, so an interrupted run can simply be
/// started again.
#[derive(Parser, Debug)]
#[command(name = "playlist-backup")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the config file (YAML, or TOML with a .toml extension)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug logging (same as -v)
    #[arg(long)]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// List what would be downloaded without writing anything
    #[arg(long)]
    pub dry_run: bool,
}
