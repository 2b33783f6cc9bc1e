//! Exit code logic for the backup process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use playlist_backup::RunStats;

use crate::ProcessExit;

/// Determines the process exit outcome from the run statistics.
pub(crate) fn determine_exit_outcome(stats: &RunStats) -> ProcessExit {
    if stats.was_canceled() {
        ProcessExit::Canceled
    } else {
        ProcessExit::Success
    }
}
