//! The user-overridable callback surface for WebSocket sessions.

use netcore_core::{Buffer, ErrorKind, SessionContext};

use crate::codec::{encode_binary, encode_close, encode_text, Role};

/// A handle passed to every [`WsHandler`] callback: the underlying
/// [`SessionContext`] plus helpers that encode and send whole WebSocket
/// messages rather than raw bytes.
#[derive(Clone)]
pub struct WsContext {
    session: SessionContext,
    role: Role,
}

impl WsContext {
    pub(crate) fn new(session: SessionContext, role: Role) -> Self {
        Self { session, role }
    }

    /// The underlying byte-stream session, for lower-level access
    /// (disconnect, counters).
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Encode and queue a text frame.
    pub fn send_text(&self, text: &str) {
        let _ = self.session.send_async(Buffer::from(&encode_text(self.role, text)[..]));
    }

    /// Encode and queue a binary frame.
    pub fn send_binary(&self, payload: &[u8]) {
        let _ = self.session.send_async(Buffer::from(&encode_binary(self.role, payload)[..]));
    }

    /// Encode and queue a close frame, then request disconnection. Per
    /// spec.md §4.7 the session tears down once the close handshake has
    /// been sent; the peer's echoed close (if any) arrives on an
    /// already-disconnecting session and is ignored.
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.session.send_async(Buffer::from(&encode_close(self.role, code, reason)[..]));
        self.session.disconnect();
    }
}

/// Per-connection behavior for a WebSocket session, the framed-protocol
/// analogue of [`netcore_core::Handler`] (spec.md §4.7).
///
/// Ping/pong and the close handshake are handled by
/// [`crate::session::WsSession`] itself and never reach this trait; a
/// handler only ever sees application messages.
pub trait WsHandler: Send + Sync + 'static {
    /// Fired once the upgrade handshake completes and the session is
    /// ready to exchange WebSocket frames.
    fn on_connected(&self, _ctx: &WsContext) {}

    /// Fired exactly once per session on the terminal edge into
    /// `Disconnected`.
    fn on_disconnected(&self, _ctx: &WsContext) {}

    /// Fired once a complete text message has been assembled.
    fn on_text(&self, _ctx: &WsContext, _text: &str) {}

    /// Fired once a complete binary message has been assembled.
    fn on_binary(&self, _ctx: &WsContext, _payload: &[u8]) {}

    /// Fired when the peer sends a close frame, before the session tears
    /// down.
    fn on_close(&self, _ctx: &WsContext, _code: Option<u16>, _reason: &str) {}

    /// Fired when the codec or handshake rejects malformed input;
    /// `message` is a human-readable description.
    fn on_protocol_error(&self, _ctx: &WsContext, _message: &str) {}

    /// Fired exactly once before (or together with) the `on_disconnected`
    /// that follows a terminal transport failure (spec.md §7). Never
    /// fired for the WebSocket close handshake, which only reaches
    /// [`WsHandler::on_close`].
    fn on_error(&self, _ctx: &WsContext, _kind: ErrorKind) {}
}
