//! `WsSession`: adapts a [`WsHandler`] to [`netcore_core::Handler`] by
//! driving the upgrade handshake (via `netcore-http`'s [`HttpCodec`]) and
//! then a per-session [`WsCodec`] over the raw receive stream.

use std::sync::Mutex as StdMutex;

use netcore_core::{Buffer, Handler, Result, SessionContext};
use netcore_http::{encode_request, encode_response, HttpCodec, HttpRequest, HttpResponse, ParsedMessage, Role as HttpRole};

use crate::codec::{encode_close, encode_pong, Role as WsRole, WsCodec};
use crate::handler::{WsContext, WsHandler};
use crate::handshake;
use crate::types::WsMessage;

enum Phase {
    Handshaking(HttpCodec),
    Framed(WsCodec),
}

enum Decoded {
    Handshake(Result<Vec<ParsedMessage>>),
    Frames(Result<Vec<WsMessage>>),
}

/// Wraps a user [`WsHandler`] with the handshake and frame-codec state
/// needed to turn a byte-stream [`netcore_core::Session`] into a
/// WebSocket session.
pub struct WsSession<H: WsHandler> {
    handler: H,
    role: WsRole,
    phase: StdMutex<Phase>,
    client_key: Option<String>,
    client_host: String,
    client_path: String,
}

impl<H: WsHandler> WsSession<H> {
    /// Construct a server-role session, awaiting the client's upgrade
    /// request.
    pub fn server(handler: H) -> Self {
        Self {
            handler,
            role: WsRole::Server,
            phase: StdMutex::new(Phase::Handshaking(HttpCodec::new(HttpRole::Server))),
            client_key: None,
            client_host: String::new(),
            client_path: String::new(),
        }
    }

    /// Construct a client-role session that will send the upgrade request
    /// for `path` on `host` as soon as the raw connection completes.
    pub fn client(handler: H, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            handler,
            role: WsRole::Client,
            phase: StdMutex::new(Phase::Handshaking(HttpCodec::new(HttpRole::Client))),
            client_key: Some(handshake::generate_client_key()),
            client_host: host.into(),
            client_path: path.into(),
        }
    }

    fn ctx(&self, session: &SessionContext) -> WsContext {
        WsContext::new(session.clone(), self.role)
    }

    fn handle_handshake(&self, session: &SessionContext, result: Result<Vec<ParsedMessage>>) {
        let messages = match result {
            Ok(messages) => messages,
            Err(e) => {
                let ctx = self.ctx(session);
                self.handler.on_protocol_error(&ctx, &e.message);
                session.disconnect();
                return;
            }
        };
        for message in messages {
            match (self.role, message) {
                (WsRole::Server, ParsedMessage::Request(req)) => self.accept_handshake(session, &req),
                (WsRole::Client, ParsedMessage::Response(resp)) => self.confirm_handshake(session, &resp),
                _ => {
                    let ctx = self.ctx(session);
                    self.handler
                        .on_protocol_error(&ctx, "unexpected message role during websocket handshake");
                    session.disconnect();
                }
            }
        }
    }

    fn accept_handshake(&self, session: &SessionContext, req: &HttpRequest) {
        match handshake::validate_upgrade_request(req) {
            Ok(client_key) => {
                let response = handshake::upgrade_response(&client_key);
                let wire = encode_response(&response);
                let _ = session.send_async(Buffer::from(&wire[..]));
                *self.phase.lock().expect("ws phase mutex poisoned") = Phase::Framed(WsCodec::new(WsRole::Server));
                let ctx = self.ctx(session);
                self.handler.on_connected(&ctx);
            }
            Err(e) => {
                let ctx = self.ctx(session);
                self.handler.on_protocol_error(&ctx, &e.message);
                session.disconnect();
            }
        }
    }

    fn confirm_handshake(&self, session: &SessionContext, resp: &HttpResponse) {
        let key = self.client_key.clone().unwrap_or_default();
        match handshake::validate_upgrade_response(resp, &key) {
            Ok(()) => {
                *self.phase.lock().expect("ws phase mutex poisoned") = Phase::Framed(WsCodec::new(WsRole::Client));
                let ctx = self.ctx(session);
                self.handler.on_connected(&ctx);
            }
            Err(e) => {
                let ctx = self.ctx(session);
                self.handler.on_protocol_error(&ctx, &e.message);
                session.disconnect();
            }
        }
    }

    fn handle_frames(&self, session: &SessionContext, result: Result<Vec<WsMessage>>) {
        let messages = match result {
            Ok(messages) => messages,
            Err(e) => {
                let ctx = self.ctx(session);
                self.handler.on_protocol_error(&ctx, &e.message);
                // RFC 6455 §7.4.1: a protocol violation closes with 1002,
                // not a bare transport teardown.
                let close = encode_close(self.role, 1002, &e.message);
                let _ = session.send_async(Buffer::from(&close[..]));
                session.disconnect();
                return;
            }
        };
        let ctx = self.ctx(session);
        for message in messages {
            match message {
                WsMessage::Text(text) => self.handler.on_text(&ctx, &text),
                WsMessage::Binary(payload) => self.handler.on_binary(&ctx, &payload),
                WsMessage::Ping(payload) => {
                    let pong = encode_pong(self.role, &payload);
                    let _ = session.send_async(Buffer::from(&pong[..]));
                }
                WsMessage::Pong(_) => {}
                WsMessage::Close { code, reason } => {
                    self.handler.on_close(&ctx, code, &reason);
                    // Echo close then tear down, per spec.md §4.7.
                    let echo = encode_close(self.role, code.unwrap_or(1000), &reason);
                    let _ = session.send_async(Buffer::from(&echo[..]));
                    session.disconnect();
                }
            }
        }
    }
}

impl<H: WsHandler> Handler for WsSession<H> {
    fn on_connected(&self, session: &SessionContext) {
        // The websocket-level `on_connected` fires only once the upgrade
        // handshake completes (see `accept_handshake`/`confirm_handshake`);
        // a client kicks that handshake off here by sending its upgrade
        // request as soon as the raw socket is live.
        if self.role == WsRole::Client {
            if let Some(key) = &self.client_key {
                let request = handshake::upgrade_request(&self.client_host, &self.client_path, key);
                let wire = encode_request(&request);
                let _ = session.send_async(Buffer::from(&wire[..]));
            }
        }
    }

    fn on_handshaked(&self, session: &SessionContext) {
        let _ = session;
    }

    fn on_disconnected(&self, session: &SessionContext) {
        let ctx = self.ctx(session);
        self.handler.on_disconnected(&ctx);
    }

    fn on_received(&self, session: &SessionContext, bytes: &[u8]) {
        let decoded = {
            let mut phase = self.phase.lock().expect("ws phase mutex poisoned");
            match &mut *phase {
                Phase::Handshaking(http_codec) => Decoded::Handshake(http_codec.feed(bytes)),
                Phase::Framed(ws_codec) => Decoded::Frames(ws_codec.feed(bytes)),
            }
        };
        match decoded {
            Decoded::Handshake(result) => self.handle_handshake(session, result),
            Decoded::Frames(result) => self.handle_frames(session, result),
        }
    }

    fn on_error(&self, session: &SessionContext, kind: netcore_core::ErrorKind) {
        let ctx = self.ctx(session);
        self.handler.on_error(&ctx, kind);
    }
}

/// A boxed per-connection factory, the shape `ServerCore`/`ClientCore`
/// expect.
pub type BoxedFactory<H> = Box<dyn Fn() -> H + Send + Sync>;

/// Wrap a user [`WsHandler`] factory so it produces server-role
/// [`WsSession`]s.
pub fn server_factory<H, F>(factory: F) -> BoxedFactory<WsSession<H>>
where
    H: WsHandler,
    F: Fn() -> H + Send + Sync + 'static,
{
    Box::new(move || WsSession::server(factory()))
}

/// As [`server_factory`], for client-role sessions targeting `host`/`path`.
pub fn client_factory<H, F>(host: String, path: String, factory: F) -> BoxedFactory<WsSession<H>>
where
    H: WsHandler,
    F: Fn() -> H + Send + Sync + 'static,
{
    Box::new(move || WsSession::client(factory(), host.clone(), path.clone()))
}
