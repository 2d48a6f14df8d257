//! `TcpServer`: bind + accept loop wrapping [`netcore_core::ServerCore`].

use std::net::SocketAddr;

use netcore_core::{Error, Handler, Listener, Registry, Result, ServerCore};
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::config::TcpConfig;
use crate::socket::{apply_no_delay, configured_socket};

/// An already-bound TCP listener, driving [`netcore_core::ServerCore`]'s
/// shared accept loop.
#[derive(Debug)]
pub struct TcpAcceptor {
    listener: TcpListener,
    config: TcpConfig,
}

impl TcpAcceptor {
    /// Bind `addr` with `config`'s socket options and `listen` with
    /// `acceptor_backlog`, without attaching a [`netcore_core::ServerCore`].
    /// Used directly by protocol crates (`netcore-http`, `netcore-ws`)
    /// that drive their own generic server over any [`Listener`].
    pub fn bind(addr: SocketAddr, config: TcpConfig) -> Result<Self> {
        let socket = configured_socket(addr, &config)?;
        socket.bind(&addr.into()).map_err(Error::from)?;
        socket
            .listen(config.acceptor_backlog as i32)
            .map_err(Error::from)?;
        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener).map_err(Error::from)?;
        info!(local_addr = %listener.local_addr().map_err(Error::from)?, "tcp acceptor bound");
        Ok(Self { listener, config })
    }

    /// The address actually bound (useful when the requested port was `0`).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl Listener for TcpAcceptor {
    type Socket = TcpStream;

    async fn accept(&self) -> std::io::Result<TcpStream> {
        let (stream, peer) = self.listener.accept().await?;
        tracing::debug!(%peer, "tcp accept");
        let _ = apply_no_delay(&stream, &self.config);
        Ok(stream)
    }
}

/// TCP server: binds a listening socket with the configured options and
/// drives [`ServerCore`] on top.
pub struct TcpServer<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    core: ServerCore<TcpAcceptor, H, F>,
    local_addr: SocketAddr,
}

impl<H, F> TcpServer<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Bind `addr` with `config`'s socket options and `listen` with
    /// `acceptor_backlog`. Bind failures are fatal, per spec.md §4.4.
    pub fn bind(addr: SocketAddr, config: TcpConfig, factory: F) -> Result<Self> {
        let acceptor = TcpAcceptor::bind(addr, config)?;
        let local_addr = acceptor.local_addr()?;
        Ok(Self {
            core: ServerCore::new(acceptor, factory),
            local_addr,
        })
    }

    /// The address actually bound (useful when `addr`'s port was `0`).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Arm the accept loop. See [`ServerCore::start`].
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
