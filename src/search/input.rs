use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::config::SearchSettings;

use super::debouncer::{DEFAULT_DEBOUNCE, SearchDebouncer};

/// State that adopts a committed search term.
///
/// Implementors return to their first page on adoption.
pub trait SearchTarget {
    fn adopt_search(&mut self, term: String);
}

/// A [`SearchDebouncer`] together with its commit channel.
///
/// Commits are applied to a [`SearchTarget`] with [`apply_ready`] or
/// [`apply_next`]; only the latest delivered commit is adopted.
///
/// [`apply_ready`]: Self::apply_ready
/// [`apply_next`]: Self::apply_next
#[derive(Debug)]
pub struct SearchInput {
    debouncer: SearchDebouncer,
    commits: mpsc::UnboundedReceiver<String>,
}

impl Default for SearchInput {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SearchInput {
    pub fn new(interval: Duration) -> Self {
        let (debouncer, commits) = SearchDebouncer::new(interval);
        Self { debouncer, commits }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(settings.debounce)
    }

    pub fn interval(&self) -> Duration {
        self.debouncer.interval()
    }

    /// Feed raw input. Must be called from within a tokio runtime.
    pub fn input(&mut self, raw: impl Into<String>) {
        self.debouncer.input(raw);
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Adopt the latest commit already delivered, if any.
    pub fn apply_ready(&mut self, target: &mut impl SearchTarget) -> bool {
        let mut latest = None;
        while let Ok(term) = self.commits.try_recv() {
            latest = Some(term);
        }
        match latest {
            Some(term) => {
                debug!(term = %term, "Applying committed search");
                target.adopt_search(term);
                true
            }
            None => false,
        }
    }

    /// Wait out a pending quiet interval, then adopt its commit.
    ///
    /// Returns `false` at once when nothing is pending or delivered.
    pub async fn apply_next(&mut self, target: &mut impl SearchTarget) -> bool {
        if self.apply_ready(target) {
            return true;
        }
        if !self.debouncer.is_pending() {
            // The timer may have fired between the two checks.
            return self.apply_ready(target);
        }
        match self.commits.recv().await {
            Some(term) => {
                target.adopt_search(term);
                self.apply_ready(target);
                true
            }
            None => false,
        }
    }

    /// Discard any pending commit. Returns whether one was discarded.
    pub fn teardown(self) -> bool {
        self.debouncer.teardown()
    }
}
