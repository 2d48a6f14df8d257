//! `UnixClient`: connector wrapping [`netcore_core::ClientCore`].

use std::path::PathBuf;

use netcore_core::{ClientCore, Connector, Handler, ReconnectHandler, Result, Session};
use tokio::net::UnixStream;
use tracing::info;

/// Connects to a fixed UNIX domain socket path.
#[derive(Debug)]
pub struct UnixConnector {
    path: PathBuf,
}

impl UnixConnector {
    /// Build a connector targeting `path`, without attaching a
    /// [`netcore_core::ClientCore`]. Used directly by protocol crates
    /// (`netcore-http`, `netcore-ws`) driving their own generic client
    /// over any [`Connector`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Connector for UnixConnector {
    type Socket = UnixStream;

    async fn connect(&self) -> std::io::Result<UnixStream> {
        let stream = UnixStream::connect(&self.path).await?;
        info!(path = %self.path.display(), "unix connected");
        Ok(stream)
    }
}

/// UNIX domain socket client: a thin facade over [`ClientCore`] fixed to
/// one socket path.
pub struct UnixClient<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    core: ClientCore<UnixConnector, H, F>,
}

impl<H, F> UnixClient<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Build a client targeting `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, factory: F) -> Self {
        Self {
            core: ClientCore::new(UnixConnector::new(path), factory),
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
