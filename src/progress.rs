//! Progress bar display for pipeline runs

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use crate::apex::{PHASES, PhaseObserver};

/// Progress display over graph phases and planned bundles
pub struct PhaseProgress {
    bar: ProgressBar,
}

impl PhaseProgress {
    /// Create a progress display; it stays hidden unless stderr is a terminal
    pub fn new(visible: bool) -> Self {
        if !visible || !Term::stderr().is_term() {
            return Self::hidden();
        }

        let bar = ProgressBar::new(PHASES.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Remove the bar before results are printed
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PhaseObserver for PhaseProgress {
    fn phase_started(&self, phase: &'static str) {
        self.bar.set_message(phase);
    }

    fn phase_finished(&self, _phase: &'static str) {
        self.bar.inc(1);
    }

    fn bundle_finished(&self, bundle: &str, _ok: bool) {
        self.bar.inc_length(1);
        self.bar.inc(1);
        self.bar.set_message(bundle.to_string());
    }
}
