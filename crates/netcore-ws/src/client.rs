//! `WsClient`: drives [`netcore_core::ClientCore`] generically over any
//! [`netcore_core::Connector`], wrapping the embedded session in a
//! [`WsSession`] that performs the client-side upgrade handshake.

use netcore_core::{ClientCore, Connector, ReconnectHandler, Result, Session};

use crate::handler::WsHandler;
use crate::session::{client_factory, BoxedFactory, WsSession};

/// A WebSocket client over any byte-stream [`Connector`] (plain TCP via
/// `netcore-tcp`, or TLS-wrapped via `netcore-tls`).
pub struct WsClient<C, H>
where
    C: Connector,
    H: WsHandler,
{
    core: ClientCore<C, WsSession<H>, BoxedFactory<WsSession<H>>>,
}

impl<C, H> WsClient<C, H>
where
    C: Connector,
    H: WsHandler,
{
    /// Wrap a not-yet-connected connector with `factory` producing one
    /// [`WsHandler`] for the client's single embedded session. The
    /// upgrade request is sent to `path` on `host` (the `Host` header
    /// value) as soon as the raw connection completes.
    pub fn new<F>(connector: C, host: impl Into<String>, path: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            core: ClientCore::new(connector, client_factory(host.into(), path.into(), factory)),
        }
    }

    /// Enable/disable the 1-second auto-reconnect timer (spec.md §4.5).
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.core.set_auto_reconnect(enabled);
    }

    /// Connect and perform the upgrade handshake, returning the embedded
    /// session handle.
    pub async fn connect(&self) -> Result<Session<ReconnectHandler<WsSession<H>>>> {
        self.core.connect().await
    }

    /// Disconnect the embedded session, sending a close frame first if
    /// the handler chooses to via [`crate::handler::WsContext::close`].
    pub async fn disconnect(&self) {
        self.core.disconnect().await;
    }

    /// The currently connected session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session<ReconnectHandler<WsSession<H>>>> {
        self.core.session()
    }
}
