//! Progress bar for backup runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use playlist_backup::{Playlist, RunObserver, RunStats, Track, TrackOutcome};

/// [`RunObserver`] that drives an `indicatif` progress bar.
pub(crate) struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Creates a visible bar when `enabled`, otherwise a hidden one.
    pub(crate) fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] {prefix} {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl RunObserver for ProgressObserver {
    fn run_started(&self, total_tracks: usize) {
        self.bar
            .set_length(u64::try_from(total_tracks).unwrap_or(u64::MAX));
    }

    fn playlist_started(&self, playlist: &Playlist) {
        self.bar.set_prefix(playlist.name.clone());
    }

    fn track_finished(&self, track: &Track, outcome: TrackOutcome) {
        self.bar.set_message(format!("{track} ({outcome})"));
        self.bar.inc(1);
    }

    fn run_finished(&self, _stats: &RunStats) {
        self.bar.finish_and_clear();
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
