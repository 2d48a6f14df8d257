//! The user-overridable callback surface for a [`crate::DatagramEngine`].

use std::net::SocketAddr;

use netcore_core::ErrorKind;

use crate::engine::DatagramContext;

/// Per-socket behavior injected by the consumer, the datagram analogue of
/// [`netcore_core::Handler`]. UDP carries no ordering guarantee across
/// datagrams (spec.md §4.3), so unlike the stream `Handler` there is no
/// `on_connected`/`on_empty`/`on_sending` — every datagram is independent.
pub trait DatagramHandler: Send + Sync + 'static {
    /// Fired once per received datagram, with the sender's address and
    /// payload. The slice is valid only for the duration of the call.
    fn on_received(&self, _ctx: &DatagramContext, _peer: SocketAddr, _bytes: &[u8]) {}

    /// Fired once a `send_async` call's `sendto` completes.
    fn on_sent(&self, _ctx: &DatagramContext, _peer: SocketAddr, _sent: usize) {}

    /// Fired on a non-retryable socket error. Per spec.md §7, `WouldBlock`/
    /// `Interrupted` are recovered locally and never reach here.
    fn on_error(&self, _ctx: &DatagramContext, _kind: ErrorKind) {}
}
