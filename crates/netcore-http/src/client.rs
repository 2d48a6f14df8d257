//! `HttpClient`: drives [`netcore_core::ClientCore`] generically over any
//! [`netcore_core::Connector`], wrapping the embedded session in an
//! [`HttpSession`].

use netcore_core::{ClientCore, Connector, ReconnectHandler, Result, Session};

use crate::handler::HttpHandler;
use crate::session::{client_factory, BoxedFactory, HttpSession};
use crate::types::HttpRequest;

/// An HTTP client over any byte-stream [`Connector`] (plain TCP via
/// `netcore-tcp`, or TLS-wrapped via `netcore-tls`).
pub struct HttpClient<C, H>
where
    C: Connector,
    H: HttpHandler,
{
    core: ClientCore<C, HttpSession<H>, BoxedFactory<HttpSession<H>>>,
}

impl<C, H> HttpClient<C, H>
where
    C: Connector,
    H: HttpHandler,
{
    /// Wrap a not-yet-connected connector with `factory` producing one
    /// [`HttpHandler`] for the client's single embedded session.
    pub fn new<F>(connector: C, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            core: ClientCore::new(connector, client_factory(factory)),
        }
    }

    /// Enable/disable the 1-second auto-reconnect timer (spec.md §4.5).
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.core.set_auto_reconnect(enabled);
    }

    /// Connect and return the embedded session handle.
    pub async fn connect(&self) -> Result<Session<ReconnectHandler<HttpSession<H>>>> {
        self.core.connect().await
    }

    /// Encode and send `request` over the currently connected session, if
    /// any.
    pub fn send_request(&self, request: &HttpRequest) -> Result<()> {
        use netcore_core::ErrorKind;
        let session = self
            .core
            .session()
            .ok_or_else(|| netcore_core::Error::new(ErrorKind::NotConnected, "no active session"))?;
        let bytes = crate::codec::encode_request(request);
        session.send_async(netcore_core::Buffer::from(&bytes[..]))
    }

    /// Disconnect the embedded session.
    pub async fn disconnect(&self) {
        self.core.disconnect().await;
    }

    /// The currently connected session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session<ReconnectHandler<HttpSession<H>>>> {
        self.core.session()
    }
}
