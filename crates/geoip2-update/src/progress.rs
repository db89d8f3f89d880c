//! Download progress reporting

use geoip2_core::Edition;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

/// Observer of the download step of each edition
///
/// `update` is called from inside the transfer loop and must return quickly.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, edition: Edition);
    fn update(&self, total: u64, so_far: u64);
    fn complete(&self);
    fn fail(&self, reason: &str);
}

/// Reporter that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&self, _edition: Edition) {}
    fn update(&self, _total: u64, _so_far: u64) {}
    fn complete(&self) {}
    fn fail(&self, _reason: &str) {}
}

/// Terminal progress bar, one per edition
#[derive(Default)]
pub struct ConsoleProgress {
    current: Mutex<Option<(Edition, ProgressBar)>>,
    hidden: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that tracks state without drawing anything
    pub fn hidden() -> Self {
        Self {
            current: Mutex::new(None),
            hidden: true,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%, {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }

    fn take(&self) -> Option<(Edition, ProgressBar)> {
        self.current.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl ProgressReporter for ConsoleProgress {
    fn start(&self, edition: Edition) {
        let pb = ProgressBar::new(0);
        if self.hidden {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        pb.set_style(Self::style());
        pb.set_message(format!("Downloading {}", edition));

        if let Ok(mut guard) = self.current.lock() {
            if let Some((_, previous)) = guard.replace((edition, pb)) {
                previous.finish_and_clear();
            }
        }
    }

    fn update(&self, total: u64, so_far: u64) {
        if let Ok(guard) = self.current.lock() {
            if let Some((_, pb)) = guard.as_ref() {
                if pb.length() != Some(total) {
                    pb.set_length(total);
                }
                pb.set_position(so_far);
            }
        }
    }

    fn complete(&self) {
        if let Some((edition, pb)) = self.take() {
            pb.finish_with_message(format!("Downloaded {}", edition));
        }
    }

    fn fail(&self, reason: &str) {
        if let Some((edition, pb)) = self.take() {
            pb.abandon_with_message(format!("Download of {} failed: {}", edition, reason));
        }
    }
}
