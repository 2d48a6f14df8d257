//! End-to-end WebSocket scenarios from spec.md §8: handshake, text echo
//! as an unmasked binary frame, and the close handshake (scenario 5).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netcore_tcp::{TcpAcceptor, TcpConfig, TcpConnector};
use netcore_ws::{encode_text, Role, WsClient, WsContext, WsHandler, WsServer};
use tokio::time::timeout;

#[derive(Default)]
struct EchoServerHandler;

impl WsHandler for EchoServerHandler {
    fn on_text(&self, ctx: &WsContext, text: &str) {
        ctx.send_binary(text.as_bytes());
    }
}

#[derive(Default)]
struct CollectingClientHandler {
    received: Arc<Mutex<Option<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
    close_on_receive: bool,
}

impl WsHandler for CollectingClientHandler {
    fn on_binary(&self, ctx: &WsContext, payload: &[u8]) {
        *self.received.lock().expect("received mutex poisoned") = Some(payload.to_vec());
        if self.close_on_receive {
            ctx.close(1000, "done");
        }
    }

    fn on_disconnected(&self, _ctx: &WsContext) {
        self.closed.store(true, Ordering::SeqCst);
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

fn start_echo_server() -> (WsServer<TcpAcceptor, EchoServerHandler>, SocketAddr) {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let acceptor = TcpAcceptor::bind(addr, TcpConfig::default()).unwrap();
    let local_addr = acceptor.local_addr().unwrap();
    let server = WsServer::with_listener(acceptor, EchoServerHandler::default);
    server.start();
    (server, local_addr)
}

#[tokio::test]
async fn websocket_text_message_is_echoed_as_binary() {
    let (server, local_addr) = start_echo_server();

    let received: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let closed = Arc::new(AtomicBool::new(false));
    let received_for_factory = received.clone();
    let closed_for_factory = closed.clone();
    let client = WsClient::new(
        TcpConnector::new(local_addr, TcpConfig::default()),
        "localhost",
        "/",
        move || CollectingClientHandler {
            received: received_for_factory.clone(),
            closed: closed_for_factory.clone(),
            close_on_receive: false,
        },
    );

    let session = client.connect().await.unwrap();
    wait_until(|| server.session_count() == 1).await;

    // The upgrade handshake is driven internally by `WsSession`; once
    // connected, a handler would send frames via `WsContext::send_text`.
    // Exercise the same wire path directly here.
    let frame = encode_text(Role::Client, "test");
    session.send_async(&frame[..]).unwrap();

    wait_until(|| received.lock().expect("received mutex poisoned").is_some()).await;
    let payload = received.lock().expect("received mutex poisoned").take().unwrap();
    assert_eq!(payload, b"test");

    client.disconnect().await;
    server.stop().await;
}

#[tokio::test]
async fn websocket_close_handshake_reaches_disconnected() {
    let (server, local_addr) = start_echo_server();

    let received: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let closed = Arc::new(AtomicBool::new(false));
    let received_for_factory = received.clone();
    let closed_for_factory = closed.clone();
    let client = WsClient::new(
        TcpConnector::new(local_addr, TcpConfig::default()),
        "localhost",
        "/",
        move || CollectingClientHandler {
            received: received_for_factory.clone(),
            closed: closed_for_factory.clone(),
            close_on_receive: true,
        },
    );

    let session = client.connect().await.unwrap();
    wait_until(|| server.session_count() == 1).await;

    let frame = encode_text(Role::Client, "test");
    session.send_async(&frame[..]).unwrap();

    // The client's handler closes as soon as it sees the echoed binary
    // message; both endpoints should reach `Disconnected`.
    wait_until(|| closed.load(Ordering::SeqCst)).await;
    wait_until(|| server.session_count() == 0).await;

    server.stop().await;
}
