//! Connector state machine with optional auto-reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::handler::Handler;
use crate::session::{Session, SessionContext};
use crate::timer::TimerFacade;

/// The reconnect delay used by `ClientCore`'s auto-reconnect, per
/// spec.md §4.5.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// A protocol-specific connector that produces one connected socket per
/// call, e.g. `TcpStream::connect` or `UnixStream::connect` wrapped by
/// `netcore-tcp`/`netcore-unix`.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The connected socket type handed to [`Session::connect`].
    type Socket: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static;

    /// Establish one connection.
    async fn connect(&self) -> std::io::Result<Self::Socket>;

    /// See [`crate::server::Listener::requires_handshake`]; the client-side
    /// analogue for connectors that hand back an already-handshaked
    /// socket (TLS).
    fn requires_handshake(&self) -> bool {
        false
    }
}

/// Delegates every callback to an inner handler, additionally scheduling
/// (or not) a reconnect when auto-reconnect is enabled. Kept separate from
/// the user's own `Handler` so `ClientCore` can own the reconnect policy
/// without requiring the user's handler to know about it.
pub struct ReconnectHandler<H: Handler> {
    inner: H,
    on_disconnected: Box<dyn Fn() + Send + Sync>,
}

impl<H: Handler> ReconnectHandler<H> {
    /// The user's own handler, for transports that need to reach through
    /// the reconnect wrapper (e.g. to downcast or inspect state).
    #[must_use]
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Handler> Handler for ReconnectHandler<H> {
    fn on_connected(&self, ctx: &SessionContext) {
        self.inner.on_connected(ctx);
    }
    fn on_handshaked(&self, ctx: &SessionContext) {
        self.inner.on_handshaked(ctx);
    }
    fn on_disconnected(&self, ctx: &SessionContext) {
        self.inner.on_disconnected(ctx);
        (self.on_disconnected)();
    }
    fn on_received(&self, ctx: &SessionContext, bytes: &[u8]) {
        self.inner.on_received(ctx, bytes);
    }
    fn on_sending(&self, ctx: &SessionContext, size: usize) -> bool {
        self.inner.on_sending(ctx, size)
    }
    fn on_sent(&self, ctx: &SessionContext, sent: usize, pending: usize) {
        self.inner.on_sent(ctx, sent, pending);
    }
    fn on_empty(&self, ctx: &SessionContext) {
        self.inner.on_empty(ctx);
    }
    fn on_error(&self, ctx: &SessionContext, kind: ErrorKind) {
        self.inner.on_error(ctx, kind);
    }
}

/// Connector state machine: `New -> Connecting -> Connected ->
/// [Handshaking -> Handshaked]? -> Disconnected`, with an embedded
/// `Session` and an optional one-shot reconnect timer (spec.md §4.5).
pub struct ClientCore<C, H, F>
where
    C: Connector,
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    connector: Arc<C>,
    factory: Arc<F>,
    auto_reconnect: Arc<AtomicBool>,
    current: Arc<StdMutex<Option<Session<ReconnectHandler<H>>>>>,
    timer: Arc<StdMutex<Option<TimerFacade>>>,
}

impl<C, H, F> Clone for ClientCore<C, H, F>
where
    C: Connector,
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            factory: self.factory.clone(),
            auto_reconnect: self.auto_reconnect.clone(),
            current: self.current.clone(),
            timer: self.timer.clone(),
        }
    }
}

impl<C, H, F> ClientCore<C, H, F>
where
    C: Connector,
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Build a client around a connector and a per-connection handler
    /// factory (a fresh handler is built for every `connect`/reconnect).
    pub fn new(connector: C, factory: F) -> Self {
        Self {
            connector: Arc::new(connector),
            factory: Arc::new(factory),
            auto_reconnect: Arc::new(AtomicBool::new(false)),
            current: Arc::new(StdMutex::new(None)),
            timer: Arc::new(StdMutex::new(None)),
        }
    }

    /// Enable or disable auto-reconnect. Taking effect on the next
    /// disconnect, not retroactively on one already in progress.
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::SeqCst);
    }

    /// The embedded session, if currently connected.
    #[must_use]
    pub fn session(&self) -> Option<Session<ReconnectHandler<H>>> {
        self.current.lock().expect("current mutex poisoned").clone()
    }

    /// Establish a fresh connection, replacing any previous one without
    /// disconnecting it first (callers that want a clean handoff should
    /// call `disconnect` first).
    pub async fn connect(&self) -> Result<Session<ReconnectHandler<H>>> {
        let socket = self.connector.connect().await.map_err(Error::from)?;

        let core = self.clone();
        let hook: Box<dyn Fn() + Send + Sync> = Box::new(move || {
            if !core.auto_reconnect.load(Ordering::SeqCst) {
                return;
            }
            let core_for_timer = core.clone();
            let core_for_store = core.clone();
            let timer = TimerFacade::schedule(RECONNECT_DELAY, move || {
                let core = core_for_timer.clone();
                tokio::spawn(async move {
                    let _ = core.reconnect().await;
                });
            });
            *core_for_store.timer.lock().expect("timer mutex poisoned") = Some(timer);
        });

        let handler = ReconnectHandler {
            inner: (self.factory)(),
            on_disconnected: hook,
        };
        let session = if self.connector.requires_handshake() {
            Session::connect_handshaked(handler, socket, crate::session::DEFAULT_RECEIVE_BUFFER_SIZE)
        } else {
            Session::connect(handler, socket)
        };
        *self.current.lock().expect("current mutex poisoned") = Some(session.clone());
        Ok(session)
    }

    /// Disconnect the embedded session, if any, and cancel any pending
    /// reconnect timer.
    pub async fn disconnect(&self) {
        if let Some(mut timer) = self.timer.lock().expect("timer mutex poisoned").take() {
            timer.cancel();
        }
        if let Some(session) = self.current.lock().expect("current mutex poisoned").take() {
            session.disconnect().await;
        }
    }

    /// Disconnect (if connected) and connect again, per spec.md §4.5.
    pub async fn reconnect(&self) -> Result<Session<ReconnectHandler<H>>> {
        self.disconnect().await;
        self.connect().await
    }
}
