//! The connectionless analogue of `netcore-core`'s session engine
//! (spec.md §4.3).

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex as StdMutex};

use netcore_core::{is_retryable, Counters, CountersSnapshot, Error, Id, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::UdpConfig;
use crate::handler::DatagramHandler;

struct Shared<H: DatagramHandler> {
    id: Id,
    socket: UdpSocket,
    handler: H,
    counters: Counters,
    shutdown: Notify,
}

/// A handle usable from a [`DatagramHandler`] callback (or user code) to
/// send further datagrams without holding a reference to the engine's
/// concrete handler type.
#[derive(Clone)]
pub struct DatagramContext {
    shared: Arc<dyn ContextOps>,
}

impl std::fmt::Debug for DatagramContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramContext").field("id", &self.shared.id()).finish()
    }
}

trait ContextOps: Send + Sync {
    fn id(&self) -> Id;
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
    fn send_to(&self, peer: SocketAddr, bytes: Vec<u8>);
    fn counters_snapshot(&self) -> CountersSnapshot;
}

impl<H: DatagramHandler> ContextOps for Arc<Shared<H>> {
    fn id(&self) -> Id {
        self.as_ref().id
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.as_ref().socket.local_addr()
    }

    fn send_to(&self, peer: SocketAddr, bytes: Vec<u8>) {
        let shared = self.clone();
        tokio::spawn(async move {
            match shared.socket.send_to(&bytes, peer).await {
                Ok(n) => {
                    shared.counters.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
                    shared.handler.on_sent(
                        &DatagramContext {
                            shared: shared.clone() as Arc<dyn ContextOps>,
                        },
                        peer,
                        n,
                    );
                }
                Err(e) => {
                    warn!(session = %shared.id, error = %e, "udp send failed");
                    shared.handler.on_error(
                        &DatagramContext {
                            shared: shared.clone() as Arc<dyn ContextOps>,
                        },
                        Error::from(e).kind,
                    );
                }
            }
        });
    }

    fn counters_snapshot(&self) -> CountersSnapshot {
        self.as_ref().counters.snapshot()
    }
}

impl DatagramContext {
    /// The engine's unique id.
    #[must_use]
    pub fn id(&self) -> Id {
        self.shared.id()
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.shared.local_addr()
    }

    /// Queue one datagram to `peer`. Returns immediately; `on_sent`/
    /// `on_error` report the outcome asynchronously.
    pub fn send_async(&self, peer: SocketAddr, bytes: impl Into<Vec<u8>>) {
        self.shared.send_to(peer, bytes.into());
    }

    /// A consistent-enough snapshot of this engine's byte counters.
    #[must_use]
    pub fn counters(&self) -> CountersSnapshot {
        self.shared.counters_snapshot()
    }
}

fn bind_socket(addr: SocketAddr, config: &UdpConfig) -> Result<Socket> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(Error::from)?;
    socket.set_nonblocking(true).map_err(Error::from)?;
    if config.reuse_address {
        socket.set_reuse_address(true).map_err(Error::from)?;
    }
    #[cfg(unix)]
    if config.reuse_port {
        socket.set_reuse_port(true).map_err(Error::from)?;
    }
    socket
        .set_recv_buffer_size(config.receive_buffer_size)
        .map_err(Error::from)?;
    socket
        .set_send_buffer_size(config.send_buffer_size)
        .map_err(Error::from)?;
    socket.bind(&addr.into()).map_err(Error::from)?;
    Ok(socket)
}

/// The connectionless counterpart of [`netcore_core::Session`]: bind,
/// optionally join/leave IPv4 multicast groups, and exchange datagrams
/// with arbitrary peers (spec.md §4.3).
///
/// Unlike `Session`, the receive side needs no user-driven
/// `receive_async()` call: the engine arms its own single-outstanding
/// `recv_from` loop (the same invariant `Session::recv_loop` gives the
/// byte-stream transports) the moment it is constructed, and hands each
/// datagram to [`DatagramHandler::on_received`] as it arrives.
pub struct DatagramEngine<H: DatagramHandler> {
    shared: Arc<Shared<H>>,
    recv_task: StdMutex<Option<JoinHandle<()>>>,
}

impl<H: DatagramHandler> DatagramEngine<H> {
    fn spawn(socket: Socket, config: &UdpConfig, handler: H) -> Result<Self> {
        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket).map_err(Error::from)?;
        let shared = Arc::new(Shared {
            id: Id::new(),
            socket,
            handler,
            counters: Counters::default(),
            shutdown: Notify::new(),
        });
        info!(session = %shared.id, local = ?shared.socket.local_addr(), "udp engine bound");

        let recv_shared = shared.clone();
        let receive_buffer_size = config.receive_buffer_size;
        let task = tokio::spawn(async move {
            recv_loop(recv_shared, receive_buffer_size).await;
        });

        Ok(Self {
            shared,
            recv_task: StdMutex::new(Some(task)),
        })
    }

    /// Bind a plain unicast datagram socket.
    pub fn bind(addr: SocketAddr, config: UdpConfig, handler: H) -> Result<Self> {
        let socket = bind_socket(addr, &config)?;
        Self::spawn(socket, &config, handler)
    }

    /// Bind `0.0.0.0:port` with `SO_REUSEADDR` and join `group`, per
    /// spec.md §4.3's `start(multicast_group, port)` overload.
    pub fn multicast(group: Ipv4Addr, port: u16, config: UdpConfig, handler: H) -> Result<Self> {
        let mut config = config;
        config.reuse_address = true;
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        let socket = bind_socket(addr, &config)?;
        socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(Error::from)?;
        let engine = Self::spawn(socket, &config, handler)?;
        debug!(session = %engine.id(), %group, "joined multicast group at bind");
        Ok(engine)
    }

    /// This engine's unique id.
    #[must_use]
    pub fn id(&self) -> Id {
        self.shared.id
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.shared.socket.local_addr()
    }

    /// A handle usable for sending without holding a reference to this
    /// engine's concrete handler type.
    #[must_use]
    pub fn context(&self) -> DatagramContext {
        DatagramContext {
            shared: self.shared.clone() as Arc<dyn ContextOps>,
        }
    }

    /// A consistent-enough snapshot of this engine's byte counters.
    #[must_use]
    pub fn counters(&self) -> CountersSnapshot {
        self.shared.counters.snapshot()
    }

    /// Join an additional IPv4 multicast group on this socket.
    pub fn join_multicast(&self, group: Ipv4Addr) -> Result<()> {
        self.shared
            .socket
            .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
            .map_err(Error::from)
    }

    /// Leave a previously joined IPv4 multicast group.
    pub fn leave_multicast(&self, group: Ipv4Addr) -> Result<()> {
        self.shared
            .socket
            .leave_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
            .map_err(Error::from)
    }

    /// Queue one datagram to `peer`. See [`DatagramContext::send_async`].
    pub fn send_async(&self, peer: SocketAddr, bytes: impl Into<Vec<u8>>) {
        self.context().send_async(peer, bytes);
    }

    /// Queue one datagram and wait for the kernel to accept it.
    pub async fn send(&self, peer: SocketAddr, bytes: impl Into<Vec<u8>>) -> Result<usize> {
        let bytes = bytes.into();
        let n = self.shared.socket.send_to(&bytes, peer).await.map_err(Error::from)?;
        self.shared.counters.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }

    /// Stop the receive loop and release the socket.
    pub fn close(&self) {
        self.shared.shutdown.notify_waiters();
        if let Some(task) = self.recv_task.lock().expect("recv_task mutex poisoned").take() {
            task.abort();
        }
    }
}

impl<H: DatagramHandler> Drop for DatagramEngine<H> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Single-outstanding-`recv_from` loop: exactly one datagram receive is
/// ever in flight, matching `Session::recv_loop`'s invariant for the
/// byte-stream transports.
async fn recv_loop<H: DatagramHandler>(shared: Arc<Shared<H>>, receive_buffer_size: usize) {
    let mut buf = vec![0u8; receive_buffer_size];
    loop {
        tokio::select! {
            () = shared.shutdown.notified() => return,
            result = shared.socket.recv_from(&mut buf) => {
                match result {
                    Ok((n, peer)) => {
                        shared.counters.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
                        let ctx = DatagramContext {
                            shared: shared.clone() as Arc<dyn ContextOps>,
                        };
                        shared.handler.on_received(&ctx, peer, &buf[..n]);
                    }
                    Err(e) if is_retryable(&e) => continue,
                    Err(e) => {
                        let ctx = DatagramContext {
                            shared: shared.clone() as Arc<dyn ContextOps>,
                        };
                        shared.handler.on_error(&ctx, Error::from(e).kind);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct Echo;
    impl DatagramHandler for Echo {
        fn on_received(&self, ctx: &DatagramContext, peer: SocketAddr, bytes: &[u8]) {
            ctx.send_async(peer, bytes.to_vec());
        }
    }

    #[derive(Default)]
    struct Counting {
        received: Arc<AtomicUsize>,
    }
    impl DatagramHandler for Counting {
        fn on_received(&self, _ctx: &DatagramContext, _peer: SocketAddr, bytes: &[u8]) {
            self.received.fetch_add(bytes.len(), Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn unicast_echo_round_trip() {
        let server =
            DatagramEngine::bind("127.0.0.1:0".parse().unwrap(), UdpConfig::default(), Echo).unwrap();
        let server_addr = server.local_addr().unwrap();

        let received = Arc::new(AtomicUsize::new(0));
        let client = DatagramEngine::bind(
            "127.0.0.1:0".parse().unwrap(),
            UdpConfig::default(),
            Counting { received: received.clone() },
        )
        .unwrap();
        client.send(server_addr, b"test".to_vec()).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while received.load(Ordering::SeqCst) != 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}
