//! `TcpClient`: connector wrapping [`netcore_core::ClientCore`].

use std::net::SocketAddr;

use netcore_core::{ClientCore, Connector, Handler, ReconnectHandler, Result, Session};
use tokio::net::TcpStream;
use tracing::info;

use crate::config::TcpConfig;
use crate::socket::{apply_no_delay, configured_socket};

/// Connects to a fixed remote address with the configured socket options
/// applied before the connection completes.
#[derive(Debug)]
pub struct TcpConnector {
    remote_addr: SocketAddr,
    config: TcpConfig,
}

impl TcpConnector {
    /// Build a connector targeting `remote_addr`, without attaching a
    /// [`netcore_core::ClientCore`]. Used directly by protocol crates
    /// (`netcore-http`, `netcore-ws`) driving their own generic client
    /// over any [`Connector`].
    #[must_use]
    pub fn new(remote_addr: SocketAddr, config: TcpConfig) -> Self {
        Self { remote_addr, config }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    type Socket = TcpStream;

    async fn connect(&self) -> std::io::Result<TcpStream> {
        let socket = configured_socket(self.remote_addr, &self.config)
            .map_err(|e| std::io::Error::other(e.message))?;
        match socket.connect(&self.remote_addr.into()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }
        let std_stream: std::net::TcpStream = socket.into();
        std_stream.set_nonblocking(true)?;
        let stream = TcpStream::from_std(std_stream)?;
        let stream = wait_connected(stream).await?;
        let _ = apply_no_delay(&stream, &self.config);
        info!(remote = %self.remote_addr, "tcp connected");
        Ok(stream)
    }
}

/// `connect(2)` on the nonblocking socket above returns `WouldBlock`
/// immediately; the handshake completes in the background and readiness
/// shows up as writability.
async fn wait_connected(stream: TcpStream) -> std::io::Result<TcpStream> {
    stream.writable().await?;
    if let Some(err) = stream.take_error()? {
        return Err(err);
    }
    Ok(stream)
}

/// TCP client: a thin facade over [`ClientCore`] fixed to one remote
/// address.
pub struct TcpClient<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    core: ClientCore<TcpConnector, H, F>,
}

impl<H, F> TcpClient<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Build a client targeting `remote_addr`.
    #[must_use]
    pub fn new(remote_addr: SocketAddr, config: TcpConfig, factory: F) -> Self {
        Self {
            core: ClientCore::new(TcpConnector::new(remote_addr, config), factory),
        }
    }

    /// Enable/disable the 1-second auto-reconnect timer (spec.md §4.5).
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.core.set_auto_reconnect(enabled);
    }

    /// Establish the connection.
    pub async fn connect(&self) -> Result<Session<ReconnectHandler<H>>> {
        self.core.connect().await
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
