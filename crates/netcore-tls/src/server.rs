//! `TlsServer`: TCP accept loop wrapping every accepted stream in a
//! `rustls` server handshake before handing it to
//! [`netcore_core::ServerCore`].

use std::net::SocketAddr;

use netcore_core::{Error, Handler, Listener, Registry, Result, ServerCore};
use netcore_tcp::TcpConfig;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::{server::TlsStream, TlsAcceptor as RustlsAcceptor};
use tracing::{info, warn};

use crate::config::TlsServerConfig;

fn bind_listener(addr: SocketAddr, config: &TcpConfig) -> Result<TcpListener> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(Error::from)?;
    socket.set_nonblocking(true).map_err(Error::from)?;
    if config.reuse_address {
        socket.set_reuse_address(true).map_err(Error::from)?;
    }
    #[cfg(unix)]
    if config.reuse_port {
        socket.set_reuse_port(true).map_err(Error::from)?;
    }
    if addr.is_ipv6() {
        socket.set_only_v6(!config.dual_stack).map_err(Error::from)?;
    }
    socket.bind(&addr.into()).map_err(Error::from)?;
    socket
        .listen(config.acceptor_backlog as i32)
        .map_err(Error::from)?;
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(Error::from)
}

/// An already-bound TCP listener that performs the TLS server handshake
/// on every accepted connection before handing the resulting
/// [`TlsStream`] to [`netcore_core::ServerCore`]'s accept loop.
///
/// Because the handshake completes entirely inside [`accept`], by the
/// time the session engine ever sees the socket it is already a
/// transparent encrypted stream — `netcore-tls` never re-implements the
/// session engine, only feeds it a different concrete socket type, per
/// spec.md §4.2 ("transparent stream transformation").
pub struct TlsAcceptor {
    listener: TcpListener,
    acceptor: RustlsAcceptor,
}

impl TlsAcceptor {
    /// Bind `addr` and configure the `rustls` server handshake, without
    /// attaching a [`netcore_core::ServerCore`]. Used directly by
    /// protocol crates (`netcore-http`, `netcore-ws`) that drive their
    /// own generic server over any [`Listener`].
    pub fn bind(addr: SocketAddr, tcp_config: TcpConfig, tls_config: TlsServerConfig) -> Result<Self> {
        let listener = bind_listener(addr, &tcp_config)?;
        info!(local_addr = %listener.local_addr().map_err(Error::from)?, "tls acceptor bound");
        Ok(Self {
            listener,
            acceptor: RustlsAcceptor::from(tls_config.inner),
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl Listener for TlsAcceptor {
    type Socket = TlsStream<TcpStream>;

    async fn accept(&self) -> std::io::Result<Self::Socket> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            match self.acceptor.accept(stream).await {
                Ok(tls) => {
                    tracing::debug!(%peer, "tls handshake complete");
                    return Ok(tls);
                }
                Err(e) => {
                    // A failed handshake on one connection must not bring
                    // down the accept loop; log and keep accepting.
                    warn!(%peer, error = %e, "tls handshake failed");
                    continue;
                }
            }
        }
    }

    fn requires_handshake(&self) -> bool {
        true
    }
}

/// TLS server: binds a TCP listener and wraps every accepted connection
/// in a `rustls` server handshake before driving [`ServerCore`] on top.
pub struct TlsServer<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    core: ServerCore<TlsAcceptor, H, F>,
    local_addr: SocketAddr,
}

impl<H, F> TlsServer<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Bind `addr` and drive [`ServerCore`] over TLS. Bind failures are
    /// fatal, per spec.md §4.4.
    pub fn bind(
        addr: SocketAddr,
        tcp_config: TcpConfig,
        tls_config: TlsServerConfig,
        factory: F,
    ) -> Result<Self> {
        let acceptor = TlsAcceptor::bind(addr, tcp_config, tls_config)?;
        let local_addr = acceptor.local_addr()?;
        Ok(Self {
            core: ServerCore::new(acceptor, factory),
            local_addr,
        })
    }

    /// The address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Arm the accept loop.
    pub fn start(&self) {
        self.core.start();
    }

    /// See [`ServerCore::stop`].
    pub async fn stop(&self) {
        self.core.stop().await;
    }

    /// `stop()` then `start()`.
    pub async fn restart(&self) {
        self.core.restart().await;
    }

    /// The live session registry.
    #[must_use]
    pub fn registry(&self) -> &std::sync::Arc<Registry<H>> {
        self.core.registry()
    }

    /// Number of currently connected sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.core.session_count()
    }

    /// Fan-out the same bytes to every currently registered session.
    pub fn multicast(&self, bytes: impl Into<netcore_core::Buffer>) {
        self.core.multicast(bytes);
    }
}
