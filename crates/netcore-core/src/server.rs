//! Acceptor state machine, generic over the concrete listening socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::is_retryable;
use crate::handler::Handler;
use crate::registry::Registry;
use crate::session::Session;

/// A protocol-specific, already-bound listening socket.
///
/// `netcore-tcp`, `netcore-unix`, and `netcore-tls` each implement this
/// over their own listener type; `ServerCore` drives the shared accept
/// loop, registry, and multicast machinery on top.
#[async_trait::async_trait]
pub trait Listener: Send + Sync + 'static {
    /// The accepted connection type handed to [`Session::connect`].
    type Socket: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static;

    /// Accept one connection. Called in a loop by `ServerCore`; at most
    /// one call is outstanding at a time.
    async fn accept(&self) -> std::io::Result<Self::Socket>;

    /// Whether sockets produced by [`Listener::accept`] have already
    /// completed a handshake (TLS) before the session engine ever sees
    /// them. When true, `ServerCore` marks the freshly connected session
    /// `Handshaked` (firing `on_handshaked`) immediately after
    /// `on_connected`, instead of leaving it in plain `Connected`.
    /// `netcore-tls` overrides this; plaintext transports keep the
    /// default.
    fn requires_handshake(&self) -> bool {
        false
    }
}

/// Acceptor state machine, session registry, fan-out primitive, and
/// start/stop/restart lifecycle, as spec.md §4.4.
///
/// Generic over `L: Listener` so the accept loop is shared code; generic
/// over `H: Handler` and a `factory: F` producing one handler instance per
/// accepted connection.
pub struct ServerCore<L, H, F>
where
    L: Listener,
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    listener: Arc<L>,
    factory: Arc<F>,
    registry: Arc<Registry<H>>,
    accept_task: StdMutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
}

impl<L, H, F> ServerCore<L, H, F>
where
    L: Listener,
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    /// Wrap an already-bound listener. Binding (and applying
    /// `acceptor_backlog`, `reuse_address`, etc.) is the caller's
    /// responsibility; `ServerCore` owns only the accept loop onward.
    pub fn new(listener: L, factory: F) -> Self {
        Self {
            listener: Arc::new(listener),
            factory: Arc::new(factory),
            registry: Arc::new(Registry::new()),
            accept_task: StdMutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The live session registry, for inspection or direct fan-out.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry<H>> {
        &self.registry
    }

    /// Number of currently connected sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Arm the first accept and begin the accept loop. Calling `start`
    /// twice without an intervening `stop` is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let listener = self.listener.clone();
        let factory = self.factory.clone();
        let registry = self.registry.clone();
        let running = self.running.clone();

        let handle = tokio::spawn(async move {
            info!("server accept loop started");
            while running.load(Ordering::SeqCst) {
                match listener.accept().await {
                    Ok(socket) => {
                        let handler = (factory)();
                        let session = if listener.requires_handshake() {
                            Session::connect_handshaked(handler, socket, crate::session::DEFAULT_RECEIVE_BUFFER_SIZE)
                        } else {
                            Session::connect(handler, socket)
                        };
                        registry.insert(session.clone());
                        let registry = registry.clone();
                        tokio::spawn(async move {
                            session.closed().await;
                            registry.remove(session.id());
                        });
                    }
                    Err(e) if is_retryable(&e) => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                }
            }
            info!("server accept loop stopped");
        });
        *self.accept_task.lock().expect("accept_task mutex poisoned") = Some(handle);
    }

    /// Stop accepting, disconnect every registered session, and wait for
    /// the registry to drain. After this returns, no user callback fires
    /// for sessions that belonged to this server.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.accept_task.lock().expect("accept_task mutex poisoned").take() {
            handle.abort();
        }
        self.registry.disconnect_all().await;
    }

    /// `stop()` followed by `start()`.
    pub async fn restart(&self) {
        self.stop().await;
        self.start();
    }

    /// Send the same bytes to every currently registered session. See
    /// [`Registry::multicast`] for the ordering contract.
    pub fn multicast(&self, bytes: impl Into<crate::buffer::Buffer>) {
        self.registry.multicast(bytes);
    }
}
