//! End-to-end UNIX domain socket scenarios, the `netcore-tcp` §8 echo and
//! fan-out cases replayed over `AF_UNIX`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netcore_core::{Handler, SessionContext};
use netcore_unix::{UnixClient, UnixConfig, UnixServer};
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

struct NullHandler;
impl Handler for NullHandler {}

async fn wait_until(mut predicate: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}

#[tokio::test]
async fn unix_echo_single_client() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netcore.sock");

    let server = UnixServer::bind(&path, UnixConfig::default(), EchoHandler::default).unwrap();
    server.start();

    let counted = Arc::new(AtomicUsize::new(0));
    let counted_for_factory = counted.clone();
    let client = UnixClient::new(path.clone(), move || CountingHandler {
        received: counted_for_factory.clone(),
    });
    let session = client.connect().await.unwrap();
    session.send(b"test".to_vec()).await.unwrap();

    wait_until(|| counted.load(Ordering::SeqCst) == 4).await;
    assert_eq!(counted.load(Ordering::SeqCst), 4);

    client.disconnect().await;
    wait_until(|| server.session_count() == 0).await;
    server.stop().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn unix_fan_out_with_three_clients() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netcore.sock");

    let server = UnixServer::bind(&path, UnixConfig::default(), || NullHandler).unwrap();
    server.start();

    let mut clients = Vec::new();
    let mut counters = Vec::new();
    for _ in 0..3 {
        let counted = Arc::new(AtomicUsize::new(0));
        let counted_for_factory = counted.clone();
        let client = UnixClient::new(path.clone(), move || CountingHandler {
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

#[tokio::test]
async fn unix_bind_removes_stale_socket_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netcore.sock");
    std::fs::write(&path, b"stale").unwrap();

    let server = UnixServer::bind(&path, UnixConfig::default(), || NullHandler).unwrap();
    server.start();
    server.stop().await;
}
