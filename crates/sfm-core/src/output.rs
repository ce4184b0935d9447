//! Verbosity control for the run.
//!
//! Three independent, composable axes: `quiet` wins over everything;
//! `verbose` raises the log level; `progress` lets collaborator-emitted
//! progress indicators reach the terminal. The configuration is an explicit
//! value threaded through the driver rather than process-global state; the
//! one global it does touch (the `log` max level) is managed through a
//! guard that restores the prior value on drop, failure paths included.

use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Verbosity axes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Detailed diagnostic logging at the most granular level.
    pub verbose: bool,
    /// Let collaborator progress indicators reach the terminal.
    pub progress: bool,
    /// Suppress all diagnostic and progress output, overriding the others.
    pub quiet: bool,
}

impl OutputConfig {
    /// Log level implied by the flags: off when quiet, debug when verbose,
    /// otherwise high-level stage announcements only.
    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Off
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Whether collaborator stdout (detailed diagnostics) is shown.
    pub fn show_collaborator_stdout(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Whether collaborator stderr (progress indicators) is shown.
    pub fn show_collaborator_progress(&self) -> bool {
        self.progress && !self.quiet
    }

    /// Apply the implied log level for the duration of the returned guard.
    ///
    /// The prior level is restored when the guard drops, so a failed run
    /// cannot leak a suppressed logger into the caller.
    pub fn apply(&self) -> OutputGuard {
        let previous = log::max_level();
        log::set_max_level(self.level_filter());
        OutputGuard { previous }
    }
}

/// Restores the prior global log level on drop.
#[derive(Debug)]
pub struct OutputGuard {
    previous: LevelFilter,
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        log::set_max_level(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(verbose: bool, progress: bool, quiet: bool) -> OutputConfig {
        OutputConfig {
            verbose,
            progress,
            quiet,
        }
    }

    #[test]
    fn quiet_wins_over_everything() {
        let c = config(true, true, true);
        assert_eq!(c.level_filter(), LevelFilter::Off);
        assert!(!c.show_collaborator_stdout());
        assert!(!c.show_collaborator_progress());
    }

    #[test]
    fn verbose_raises_level() {
        assert_eq!(config(true, false, false).level_filter(), LevelFilter::Debug);
        assert_eq!(config(false, false, false).level_filter(), LevelFilter::Info);
    }

    #[test]
    fn progress_controls_collaborator_stderr() {
        assert!(config(false, true, false).show_collaborator_progress());
        assert!(!config(false, false, false).show_collaborator_progress());
        assert!(!config(false, true, true).show_collaborator_progress());
    }

    #[test]
    fn guard_restores_previous_level() {
        let before = log::max_level();
        {
            let _guard = config(false, false, true).apply();
            assert_eq!(log::max_level(), LevelFilter::Off);
        }
        assert_eq!(log::max_level(), before);
    }
}
