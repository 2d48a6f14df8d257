//! The user-overridable callback surface for a [`Session`](crate::session::Session).

use crate::error::ErrorKind;
use crate::session::SessionContext;

/// Per-connection behavior injected by the consumer.
///
/// `SessionEngine` is generic over `H: Handler`, not a trait object, so
/// the callback path is statically dispatched rather than paying for a
/// vtable call on every received slice. Every method has a default no-op
/// body; implement only the callbacks a given transport cares about.
///
/// Handlers are shared across the worker threads that may service a given
/// session's completions over time, so `Handler: Send + Sync`. Calling
/// `ctx.send(..)` from inside `on_received` is supported; the send
/// pipeline tolerates this re-entrant pattern (see [`crate::session`]).
pub trait Handler: Send + Sync + 'static {
    /// Fired once a session transitions into `Connected`.
    fn on_connected(&self, _ctx: &SessionContext) {}

    /// Fired once a TLS session completes its handshake. Never called for
    /// plaintext sessions.
    fn on_handshaked(&self, _ctx: &SessionContext) {}

    /// Fired exactly once per session, on the terminal edge into
    /// `Disconnected`. Repeated close notifications are suppressed by the
    /// engine, never delivered here.
    fn on_disconnected(&self, _ctx: &SessionContext) {}

    /// Fired once per receive completion with the bytes the peer sent.
    /// The slice is valid only for the duration of the call.
    fn on_received(&self, _ctx: &SessionContext, _bytes: &[u8]) {}

    /// Back-pressure hook: called before a send is queued, with the
    /// number of bytes about to be appended. Returning `false` vetoes the
    /// send (the caller observes it as if nothing happened).
    #[must_use]
    fn on_sending(&self, _ctx: &SessionContext, _size: usize) -> bool {
        true
    }

    /// Fired when the kernel drains a chunk of the flush buffer: `sent` is
    /// the number of bytes accepted by this completion, `pending` is the
    /// number of bytes still queued across both send buffers.
    fn on_sent(&self, _ctx: &SessionContext, _sent: usize, _pending: usize) {}

    /// Fired whenever both send buffers fully drain.
    fn on_empty(&self, _ctx: &SessionContext) {}

    /// Fired exactly once before (or together with) the `on_disconnected`
    /// that follows a terminal failure. Never fired for `WouldBlock`/
    /// `Interrupted`, which are retried locally, or for orderly peer
    /// close, which is reported only via `on_disconnected`.
    fn on_error(&self, _ctx: &SessionContext, _kind: ErrorKind) {}
}
