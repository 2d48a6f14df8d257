//! `TlsClient`: connector performing a `rustls` client handshake before
//! handing the stream to [`netcore_core::ClientCore`].

use std::net::SocketAddr;

use netcore_core::{ClientCore, Connector, Error, Handler, ReconnectHandler, Result, Session};
use netcore_tcp::TcpConfig;
use rustls::pki_types::ServerName;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector as RustlsConnector};
use tracing::info;

use crate::config::TlsClientConfig;

/// Connects to a fixed remote address and immediately performs a TLS
/// client handshake, per spec.md §4.2.
pub struct TlsConnector {
    remote_addr: SocketAddr,
    tcp_config: TcpConfig,
    tls_config: TlsClientConfig,
}

impl TlsConnector {
    /// Build a connector targeting `remote_addr`, without attaching a
    /// [`netcore_core::ClientCore`]. Used directly by protocol crates
    /// (`netcore-http`, `netcore-ws`) driving their own generic client
    /// over any [`Connector`].
    ///
    /// Callers driving this connector directly (rather than through
    /// [`TlsClient`]) see rustls handshake failures surface as
    /// `ErrorKind::Other` rather than `TlsHandshakeFailed`; see
    /// [`TlsClient::connect`] for the recategorization `netcore-tls`
    /// itself applies.
    #[must_use]
    pub fn new(remote_addr: SocketAddr, tcp_config: TcpConfig, tls_config: TlsClientConfig) -> Self {
        Self {
            remote_addr,
            tcp_config,
            tls_config,
        }
    }
}

#[async_trait::async_trait]
impl Connector for TlsConnector {
    type Socket = TlsStream<TcpStream>;

    async fn connect(&self) -> std::io::Result<Self::Socket> {
        let domain = if self.remote_addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        socket
            .set_recv_buffer_size(self.tcp_config.receive_buffer_size)?;
        socket
            .set_send_buffer_size(self.tcp_config.send_buffer_size)?;
        match socket.connect(&self.remote_addr.into()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }
        let std_stream: std::net::TcpStream = socket.into();
        std_stream.set_nonblocking(true)?;
        let stream = TcpStream::from_std(std_stream)?;
        stream.writable().await?;
        if let Some(err) = stream.take_error()? {
            return Err(err);
        }
        if self.tcp_config.no_delay {
            stream.set_nodelay(true)?;
        }

        let server_name = ServerName::try_from(self.tls_config.server_name.clone())
            .map_err(std::io::Error::other)?;
        let connector = RustlsConnector::from(self.tls_config.inner.clone());
        let tls = connector.connect(server_name, stream).await?;
        info!(remote = %self.remote_addr, "tls connected");
        Ok(tls)
    }

    fn requires_handshake(&self) -> bool {
        true
    }
}

/// TLS client: a thin facade over [`ClientCore`] fixed to one remote
/// address and TLS configuration.
pub struct TlsClient<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    core: ClientCore<TlsConnector, H, F>,
}

impl<H, F> TlsClient<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Build a client targeting `remote_addr`.
    #[must_use]
    pub fn new(
        remote_addr: SocketAddr,
        tcp_config: TcpConfig,
        tls_config: TlsClientConfig,
        factory: F,
    ) -> Self {
        Self {
            core: ClientCore::new(TlsConnector::new(remote_addr, tcp_config, tls_config), factory),
        }
    }

    /// Enable/disable the 1-second auto-reconnect timer (spec.md §4.5).
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.core.set_auto_reconnect(enabled);
    }

    /// Establish the connection, completing the TLS handshake before
    /// returning.
    ///
    /// [`TlsConnector::connect`] reports every rustls-specific failure
    /// (bad certificate, protocol mismatch, bad SNI name) through
    /// `io::Error::other`, which the generic `io::Error -> Error`
    /// conversion in `netcore-core` has no way to distinguish from an
    /// uncategorized I/O failure; recategorize it here as
    /// `TlsHandshakeFailed`, which is what it actually is on this path.
    pub async fn connect(&self) -> Result<Session<ReconnectHandler<H>>> {
        self.core.connect().await.map_err(|e| match e {
            e if e.kind == netcore_core::ErrorKind::Other => {
                Error::new(netcore_core::ErrorKind::TlsHandshakeFailed, e.message)
            }
            e => e,
        })
    }

    /// Disconnect and cancel any pending reconnect timer.
    pub async fn disconnect(&self) {
        self.core.disconnect().await;
    }

    /// The embedded session, if currently connected.
    #[must_use]
    pub fn session(&self) -> Option<Session<ReconnectHandler<H>>> {
        self.core.session()
    }
}
