//! The user-overridable callback surface for HTTP sessions.

use std::sync::Arc;

use netcore_core::{Buffer, ErrorKind, SessionContext};

use crate::codec::{encode_request, encode_response, Role};
use crate::types::{HttpRequest, HttpResponse};

/// A handle passed to every [`HttpHandler`] callback: the underlying
/// [`SessionContext`] plus helpers that encode and send whole messages
/// rather than raw bytes.
#[derive(Clone)]
pub struct HttpContext {
    session: SessionContext,
    role: Role,
}

impl HttpContext {
    pub(crate) fn new(session: SessionContext, role: Role) -> Self {
        Self { session, role }
    }

    /// The underlying byte-stream session, for lower-level access
    /// (disconnect, counters).
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Encode `response` with strict CRLF framing and queue it for send.
    /// Valid on a [`Role::Server`]-mode session.
    pub fn respond(&self, response: &HttpResponse) {
        debug_assert_eq!(self.role, Role::Server, "respond() called on a client-role HttpContext");
        let bytes = encode_response(response);
        let _ = self.session.send_async(Buffer::from(&bytes[..]));
    }

    /// Encode `request` with strict CRLF framing and queue it for send.
    /// Valid on a [`Role::Client`]-mode session.
    pub fn send_request(&self, request: &HttpRequest) {
        debug_assert_eq!(self.role, Role::Client, "send_request() called on a server-role HttpContext");
        let bytes = encode_request(request);
        let _ = self.session.send_async(Buffer::from(&bytes[..]));
    }
}

/// Per-connection behavior for an HTTP session, the framed-protocol
/// analogue of [`netcore_core::Handler`] (spec.md §4.6).
///
/// A server-role session fires `on_request`; a client-role session fires
/// `on_response`. Parser failures invoke `on_parse_error` and, per
/// spec.md §7, leave the session alive at the handler's discretion — the
/// core never auto-closes on an HTTP parse error.
pub trait HttpHandler: Send + Sync + 'static {
    /// Fired once a session transitions into `Connected`.
    fn on_connected(&self, _ctx: &HttpContext) {}

    /// Fired exactly once per session on the terminal edge into
    /// `Disconnected`.
    fn on_disconnected(&self, _ctx: &HttpContext) {}

    /// Fired once a full request has been parsed (server role).
    fn on_request(&self, _ctx: &HttpContext, _req: &HttpRequest) {}

    /// Fired once a full response has been parsed (client role).
    fn on_response(&self, _ctx: &HttpContext, _resp: &HttpResponse) {}

    /// Fired when the codec rejects malformed input; `message` is a
    /// human-readable description. The session is not closed automatically.
    fn on_parse_error(&self, _ctx: &HttpContext, _message: &str) {}

    /// Fired exactly once before (or together with) the `on_disconnected`
    /// that follows a terminal transport failure (spec.md §7). Never
    /// fired for an orderly peer close or for a recoverable parse error,
    /// which only reach [`HttpHandler::on_parse_error`].
    fn on_error(&self, _ctx: &HttpContext, _kind: ErrorKind) {}
}

/// Shared static content, looked up before `on_request` fires for `GET`
/// and `HEAD` requests on a server-role session (spec.md §4.6).
pub type StaticCacheHandle = Arc<crate::static_cache::StaticContentCache>;
