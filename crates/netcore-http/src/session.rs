//! `HttpSession`: adapts a [`HttpHandler`] to [`netcore_core::Handler`] by
//! running a per-session [`HttpCodec`] over the raw receive stream.

use std::sync::Mutex as StdMutex;

use netcore_core::{ErrorKind, Handler, SessionContext};
use tracing::warn;

use crate::codec::{HttpCodec, Role};
use crate::handler::{HttpContext, HttpHandler, StaticCacheHandle};
use crate::types::ParsedMessage;

/// Wraps a user [`HttpHandler`] with the HTTP framing state needed to turn
/// a byte-stream [`netcore_core::Session`] into a request/response session.
pub struct HttpSession<H: HttpHandler> {
    handler: H,
    role: Role,
    codec: StdMutex<HttpCodec>,
    static_cache: Option<StaticCacheHandle>,
}

impl<H: HttpHandler> HttpSession<H> {
    /// Construct a server-role session with optional static content.
    pub fn server(handler: H, static_cache: Option<StaticCacheHandle>) -> Self {
        Self {
            handler,
            role: Role::Server,
            codec: StdMutex::new(HttpCodec::new(Role::Server)),
            static_cache,
        }
    }

    /// Construct a client-role session.
    pub fn client(handler: H) -> Self {
        Self {
            handler,
            role: Role::Client,
            codec: StdMutex::new(HttpCodec::new(Role::Client)),
            static_cache: None,
        }
    }

    fn ctx(&self, session: &SessionContext) -> HttpContext {
        HttpContext::new(session.clone(), self.role)
    }

    fn resolve_static(&self, ctx: &HttpContext, req: &crate::types::HttpRequest) -> bool {
        if req.method != "GET" && req.method != "HEAD" {
            return false;
        }
        let Some(cache) = &self.static_cache else {
            return false;
        };
        let Some(entry) = cache.get(&req.url) else {
            return false;
        };
        let response = if req.method == "HEAD" {
            crate::builders::make_head_response(entry.bytes.clone())
        } else {
            crate::builders::make_get_response_with_content_type(entry.bytes.clone(), &entry.content_type)
        };
        ctx.respond(&response);
        true
    }
}

impl<H: HttpHandler> Handler for HttpSession<H> {
    fn on_connected(&self, session: &SessionContext) {
        self.handler.on_connected(&self.ctx(session));
    }

    fn on_handshaked(&self, session: &SessionContext) {
        // HTTP has no handshake of its own; TLS-over-HTTP handshakes are
        // reported by the underlying netcore-tls session, not here.
        let _ = session;
    }

    fn on_disconnected(&self, session: &SessionContext) {
        if let Ok(mut codec) = self.codec.lock() {
            if let Ok(Some(ParsedMessage::Response(resp))) = codec.finish_on_eof() {
                self.handler.on_response(&self.ctx(session), &resp);
            }
        }
        self.handler.on_disconnected(&self.ctx(session));
    }

    fn on_received(&self, session: &SessionContext, bytes: &[u8]) {
        let ctx = self.ctx(session);
        let messages = {
            let mut codec = self.codec.lock().expect("http codec mutex poisoned");
            match codec.feed(bytes) {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(error = %e, "http parse error");
                    self.handler.on_parse_error(&ctx, &e.message);
                    return;
                }
            }
        };

        for message in messages {
            match message {
                ParsedMessage::Request(req) => {
                    if !self.resolve_static(&ctx, &req) {
                        self.handler.on_request(&ctx, &req);
                    }
                }
                ParsedMessage::Response(resp) => {
                    self.handler.on_response(&ctx, &resp);
                }
            }
        }
    }

    fn on_error(&self, session: &SessionContext, kind: ErrorKind) {
        self.handler.on_error(&self.ctx(session), kind);
    }
}

/// A boxed per-connection factory, the shape `ServerCore`/`ClientCore`
/// expect: they store `Arc<F>` and call it once per accepted/connected
/// socket.
pub type BoxedFactory<H> = Box<dyn Fn() -> H + Send + Sync>;

/// Wrap a user [`HttpHandler`] factory so it produces [`HttpSession`]s,
/// the `netcore_core::Handler` `ServerCore`'s accept loop actually drives.
pub fn server_factory<H, F>(factory: F, static_cache: Option<StaticCacheHandle>) -> BoxedFactory<HttpSession<H>>
where
    H: HttpHandler,
    F: Fn() -> H + Send + Sync + 'static,
{
    Box::new(move || HttpSession::server(factory(), static_cache.clone()))
}

/// As [`server_factory`], for client-role sessions.
pub fn client_factory<H, F>(factory: F) -> BoxedFactory<HttpSession<H>>
where
    H: HttpHandler,
    F: Fn() -> H + Send + Sync + 'static,
{
    Box::new(move || HttpSession::client(factory()))
}
