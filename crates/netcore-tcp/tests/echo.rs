//! End-to-end TCP scenarios from spec.md §8.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netcore_core::{Handler, SessionContext};
use netcore_tcp::{TcpClient, TcpConfig, TcpServer};
use tokio::time::timeout;

#[derive(Default)]
struct EchoHandler;

impl Handler for EchoHandler {
    fn on_received(&self, ctx: &SessionContext, bytes: &[u8]) {
        let _ = ctx.send_async(bytes.to_vec());
    }
}

#[derive(Default)]
struct CountingHandler {
    received: Arc<AtomicUsize>,
}

impl Handler for CountingHandler {
    fn on_received(&self, _ctx: &SessionContext, bytes: &[u8]) {
        self.received.fetch_add(bytes.len(), Ordering::SeqCst);
    }
}

async fn wait_until(mut predicate: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}

fn init_tracing() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

#[tokio::test]
async fn tcp_echo_single_client() {
    init_tracing();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = TcpServer::bind(addr, TcpConfig::default(), EchoHandler::default).unwrap();
    server.start();

    let counted = Arc::new(AtomicUsize::new(0));
    let counted_for_factory = counted.clone();
    let client = TcpClient::new(server.local_addr(), TcpConfig::default(), move || CountingHandler {
        received: counted_for_factory.clone(),
    });
    let session = client.connect().await.unwrap();
    session.send(b"test".to_vec()).await.unwrap();

    wait_until(|| counted.load(Ordering::SeqCst) == 4).await;
    assert_eq!(counted.load(Ordering::SeqCst), 4);

    client.disconnect().await;
    wait_until(|| server.session_count() == 0).await;
    server.stop().await;
}

#[tokio::test]
async fn tcp_fan_out_with_three_clients() {
    init_tracing();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = TcpServer::bind(addr, TcpConfig::default(), || NullHandler).unwrap();
    server.start();

    let mut clients = Vec::new();
    let mut counters = Vec::new();
    for _ in 0..3 {
        let counted = Arc::new(AtomicUsize::new(0));
        let counted_for_factory = counted.clone();
        let client = TcpClient::new(server.local_addr(), TcpConfig::default(), move || CountingHandler {
            received: counted_for_factory.clone(),
        });
        let _session = client.connect().await.unwrap();
        wait_until(|| server.session_count() >= counters.len() + 1).await;
        server.multicast(b"test".to_vec());
        counters.push(counted);
        clients.push(client);
    }

    for (i, counter) in counters.iter().enumerate() {
        let expected = (4 * (counters.len() - i)) as usize;
        wait_until(|| counter.load(Ordering::SeqCst) == expected).await;
    }

    server.stop().await;
}

struct NullHandler;
impl Handler for NullHandler {}
