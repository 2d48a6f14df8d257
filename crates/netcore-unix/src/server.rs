//! `UnixServer`: bind + accept loop wrapping [`netcore_core::ServerCore`].

use std::path::{Path, PathBuf};

use netcore_core::{Error, Handler, Listener, Registry, Result, ServerCore};
use tokio::net::{UnixListener, UnixStream};
use tracing::info;

use crate::config::UnixConfig;

/// An already-bound UNIX domain socket listener. Removes the socket file
/// on drop, mirroring the source's cleanup-on-disconnect behavior.
#[derive(Debug)]
pub struct UnixAcceptor {
    listener: UnixListener,
    path: PathBuf,
}

impl Drop for UnixAcceptor {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl UnixAcceptor {
    /// Bind `path`, removing any stale socket file first, without
    /// attaching a [`netcore_core::ServerCore`]. Used directly by
    /// protocol crates (`netcore-http`, `netcore-ws`) that drive their
    /// own generic server over any [`Listener`].
    pub fn bind(path: impl AsRef<Path>, config: UnixConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // A previous, uncleanly terminated server can leave the socket
        // file behind; bind fails with AddressInUse unless it's removed.
        let _ = std::fs::remove_file(&path);

        let socket = socket2::Socket::new(socket2::Domain::UNIX, socket2::Type::STREAM, None)
            .map_err(Error::from)?;
        socket.set_nonblocking(true).map_err(Error::from)?;
        let addr = socket2::SockAddr::unix(&path).map_err(Error::from)?;
        socket.bind(&addr).map_err(Error::from)?;
        socket
            .listen(config.acceptor_backlog as i32)
            .map_err(Error::from)?;
        let std_listener: std::os::unix::net::UnixListener = socket.into();
        let listener = UnixListener::from_std(std_listener).map_err(Error::from)?;

        info!(path = %path.display(), "unix acceptor bound");
        Ok(Self { listener, path })
    }

    /// The bound socket path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl Listener for UnixAcceptor {
    type Socket = UnixStream;

    async fn accept(&self) -> std::io::Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(stream)
    }
}

/// UNIX domain socket server: binds the socket path (removing a stale
/// file left over from a previous run) and drives [`ServerCore`] on top.
pub struct UnixServer<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    core: ServerCore<UnixAcceptor, H, F>,
    path: PathBuf,
}

impl<H, F> UnixServer<H, F>
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Bind `path`, removing any stale socket file first. Bind failures
    /// are fatal, per spec.md §4.4.
    pub fn bind(path: impl AsRef<Path>, config: UnixConfig, factory: F) -> Result<Self> {
        let acceptor = UnixAcceptor::bind(path, config)?;
        let path = acceptor.path().to_path_buf();
        Ok(Self {
            core: ServerCore::new(acceptor, factory),
            path,
        })
    }

    /// The bound socket path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arm the accept loop.
    pub fn start(&self) {
        self.core.start();
    }

    /// Stop accepting and disconnect every session.
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
