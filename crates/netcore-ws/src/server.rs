//! `WsServer`: drives [`netcore_core::ServerCore`] generically over any
//! [`netcore_core::Listener`], wrapping each accepted session in a
//! [`WsSession`], plus the `multicast_text`/`multicast_binary` helpers
//! from spec.md §4.7.

use netcore_core::{Listener, Registry, ServerCore};

use crate::codec::{encode_binary, encode_text, Role};
use crate::handler::WsHandler;
use crate::session::{server_factory, BoxedFactory, WsSession};

/// A WebSocket server over any byte-stream [`Listener`] (plain TCP via
/// `netcore-tcp`, UNIX via `netcore-unix`, or TLS-wrapped via
/// `netcore-tls`).
pub struct WsServer<L, H>
where
    L: Listener,
    H: WsHandler,
{
    core: ServerCore<L, WsSession<H>, BoxedFactory<WsSession<H>>>,
}

impl<L, H> WsServer<L, H>
where
    L: Listener,
    H: WsHandler,
{
    /// Wrap an already-bound listener with `factory` producing one
    /// [`WsHandler`] per connection.
    pub fn with_listener<F>(listener: L, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            core: ServerCore::new(listener, server_factory(factory)),
        }
    }

    /// Arm the accept loop.
    pub fn start(&self) {
        self.core.start();
    }

    /// See [`ServerCore::stop`].
    pub async fn stop(&self) {
        self.core.stop().await;
    }

    /// See [`ServerCore::restart`].
    pub async fn restart(&self) {
        self.core.restart().await;
    }

    /// The live session registry.
    #[must_use]
    pub fn registry(&self) -> &std::sync::Arc<Registry<WsSession<H>>> {
        self.core.registry()
    }

    /// Number of currently connected sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.core.session_count()
    }

    /// Pre-encode one unmasked text frame and broadcast it through the
    /// registry's fan-out, per spec.md §4.7's `MulticastText`. Every
    /// session sees the same already-framed bytes.
    pub fn multicast_text(&self, text: &str) {
        let wire = encode_text(Role::Server, text);
        self.core.multicast(&wire[..]);
    }

    /// As [`WsServer::multicast_text`], for `MulticastBinary`.
    pub fn multicast_binary(&self, payload: &[u8]) {
        let wire = encode_binary(Role::Server, payload);
        self.core.multicast(&wire[..]);
    }
}
