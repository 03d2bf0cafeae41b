use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::SearchSettings;

use super::timer::CancellableTimer;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Coalesces raw search input into committed terms.
///
/// Each [`input`](Self::input) restarts the quiet interval; a term is sent on
/// the commit channel only once the interval passes with no further input.
#[derive(Debug)]
pub struct SearchDebouncer {
    interval: Duration,
    timer: CancellableTimer,
    commits: mpsc::UnboundedSender<String>,
}

impl SearchDebouncer {
    /// Create a debouncer and the receiver its commits arrive on.
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (commits, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            interval,
            timer: CancellableTimer::new(),
            commits,
        };
        (debouncer, rx)
    }

    pub fn from_settings(settings: &SearchSettings) -> (Self, mpsc::UnboundedReceiver<String>) {
        Self::new(settings.debounce)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accept a raw value, superseding any pending commit.
    pub fn input(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        trace!(term = %raw, "Search input");
        let commits = self.commits.clone();
        self.timer.schedule(self.interval, move || {
            debug!(term = %raw, "Search term committed");
            // Receiver gone means the view unmounted.
            let _ = commits.send(raw);
        });
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Tear down, discarding any pending commit. Returns whether one was
    /// discarded.
    pub fn teardown(mut self) -> bool {
        let discarded = self.timer.cancel();
        if discarded {
            debug!("Search debouncer torn down with a pending commit");
        }
        discarded
    }
}
