//! The facade crate adds no behavior of its own; this just checks the
//! `prelude` re-exports resolve to the same working types the per-protocol
//! crates' own test suites exercise directly (spec.md §8 scenario 1, TCP
//! echo, driven entirely through `netcore::prelude`).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netcore::prelude::*;
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

#[tokio::test]
async fn tcp_echo_via_prelude() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = TcpServer::bind(addr, TcpConfig::default(), EchoHandler::default).unwrap();
    server.start();

    let received = Arc::new(AtomicUsize::new(0));
    let received_for_factory = received.clone();
    let client = TcpClient::new(server.local_addr(), TcpConfig::default(), move || CountingHandler {
        received: received_for_factory.clone(),
    });
    client.connect().await.unwrap();

    let session = client.session().unwrap();
    session.send_async(b"test".to_vec()).unwrap();

    timeout(Duration::from_secs(2), async {
        while received.load(Ordering::SeqCst) < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("echo never arrived");

    assert_eq!(received.load(Ordering::SeqCst), 4);
    client.disconnect().await;
    server.stop().await;
}

#[test]
fn features_report_compiled_in_transports() {
    assert!(netcore::Features::has_tcp());
}
