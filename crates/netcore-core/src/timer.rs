//! One-shot scheduled callback, used for `ClientCore`'s reconnect delay.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A cancellable one-shot timer.
///
/// The source's reconnect timer busy-yields while waiting; the idiomatic
/// replacement is `tokio::time::sleep` raced against a cancellation
/// `Notify`, which parks the task instead of spinning (spec.md §9,
/// REDESIGN FLAGS).
#[derive(Debug)]
pub struct TimerFacade {
    cancel: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl TimerFacade {
    /// Schedule `callback` to run after `delay`, unless cancelled first.
    pub fn schedule<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = Arc::new(Notify::new());
        let cancel_wait = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => callback(),
                () = cancel_wait.notified() => {}
            }
        });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the timer. A no-op if it has already fired or been
    /// cancelled.
    pub fn cancel(&mut self) {
        self.cancel.notify_one();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerFacade {
    fn drop(&mut self) {
        self.cancel.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn fires_after_the_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        let _timer = TimerFacade::schedule(Duration::from_millis(10), move || {
            fired_clone.store(true, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        let mut timer = TimerFacade::schedule(Duration::from_millis(20), move || {
            fired_clone.store(true, Ordering::SeqCst);
        });
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
