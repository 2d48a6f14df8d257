//! Lock-free session counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic byte counters for a single [`Session`](crate::session::Session),
/// updated without locking so any thread can read a consistent-enough
/// snapshot while the engine is live.
///
/// Per spec: `bytes_sent + bytes_sending + bytes_pending` is monotonic
/// non-decreasing over the session's lifetime.
#[derive(Debug, Default)]
pub struct Counters {
    /// Bytes queued by the user but not yet handed to the kernel.
    pub bytes_pending: AtomicU64,
    /// Bytes currently being handed to the kernel by the in-flight send.
    pub bytes_sending: AtomicU64,
    /// Bytes the kernel has accepted over the session's lifetime.
    pub bytes_sent: AtomicU64,
    /// Bytes delivered to `on_received` over the session's lifetime.
    pub bytes_received: AtomicU64,
}

/// A point-in-time, non-atomic copy of a [`Counters`] suitable for logging
/// or exposing to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    /// See [`Counters::bytes_pending`].
    pub bytes_pending: u64,
    /// See [`Counters::bytes_sending`].
    pub bytes_sending: u64,
    /// See [`Counters::bytes_sent`].
    pub bytes_sent: u64,
    /// See [`Counters::bytes_received`].
    pub bytes_received: u64,
}

impl Counters {
    /// Take a consistent-enough snapshot of all four counters.
    #[must_use]
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            bytes_pending: self.bytes_pending.load(Ordering::Relaxed),
            bytes_sending: self.bytes_sending.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_updates() {
        let counters = Counters::default();
        counters.bytes_sent.fetch_add(4, Ordering::Relaxed);
        counters.bytes_received.fetch_add(10, Ordering::Relaxed);

        let snap = counters.snapshot();
        assert_eq!(snap.bytes_sent, 4);
        assert_eq!(snap.bytes_received, 10);
        assert_eq!(snap.bytes_pending, 0);
    }
}
