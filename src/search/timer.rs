use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// One-shot delayed action that can be cancelled until it fires.
///
/// Scheduling again cancels whatever was pending. Dropping the timer cancels
/// it too, so an action never runs after its owner is gone.
#[derive(Debug, Default)]
pub struct CancellableTimer {
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `delay` has elapsed, replacing any pending action.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                action();
            }
        });
        self.pending = Some(Pending { handle, cancelled });
    }

    /// Cancel the pending action. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        pending.cancelled.store(true, Ordering::SeqCst);
        let was_waiting = !pending.handle.is_finished();
        pending.handle.abort();
        was_waiting
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
