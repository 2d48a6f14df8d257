//! TLS echo scenario: the TCP scenario of spec.md §8 scenario 1, over an
//! encrypted stream, plus the TLS-specific invariant from spec.md §8
//! ("no `on_received` callback fires before `on_handshaked`").

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netcore_core::{Handler, SessionContext};
use netcore_tcp::TcpConfig;
use netcore_tls::{TlsClient, TlsClientConfig, TlsServer, TlsServerConfig};
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer};
use tokio::time::timeout;

fn self_signed_config() -> (TlsServerConfig, TlsClientConfig) {
    let rcgen::CertifiedKey { cert, signing_key } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_der = CertificateDer::from(cert.der().to_vec());
    let key_der = PrivatePkcs8KeyDer::from(signing_key.serialize_der());

    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der.clone()], key_der.into())
        .unwrap();

    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert_der).unwrap();
    let client_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    (
        TlsServerConfig::new(Arc::new(server_config)),
        TlsClientConfig::new(Arc::new(client_config), "localhost"),
    )
}

#[derive(Default)]
struct EchoHandler;

impl Handler for EchoHandler {
    fn on_received(&self, ctx: &SessionContext, bytes: &[u8]) {
        let _ = ctx.send_async(bytes.to_vec());
    }
}

struct RecordingHandler {
    received: Arc<AtomicUsize>,
    handshaked_before_any_receive: Arc<AtomicBool>,
    handshaked: Arc<AtomicBool>,
}

impl Handler for RecordingHandler {
    fn on_handshaked(&self, _ctx: &SessionContext) {
        self.handshaked.store(true, Ordering::SeqCst);
    }
    fn on_received(&self, _ctx: &SessionContext, bytes: &[u8]) {
        if !self.handshaked.load(Ordering::SeqCst) {
            self.handshaked_before_any_receive.store(false, Ordering::SeqCst);
        }
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

#[tokio::test]
async fn tls_echo_single_client() {
    let (server_tls, client_tls) = self_signed_config();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = TlsServer::bind(addr, TcpConfig::default(), server_tls, EchoHandler::default).unwrap();
    server.start();

    let received = Arc::new(AtomicUsize::new(0));
    let handshaked_first = Arc::new(AtomicBool::new(true));
    let handshaked = Arc::new(AtomicBool::new(false));
    let r2 = received.clone();
    let hf2 = handshaked_first.clone();
    let h2 = handshaked.clone();
    let client = TlsClient::new(server.local_addr(), TcpConfig::default(), client_tls, move || {
        RecordingHandler {
            received: r2.clone(),
            handshaked_before_any_receive: hf2.clone(),
            handshaked: h2.clone(),
        }
    });
    let session = client.connect().await.unwrap();
    assert!(handshaked.load(Ordering::SeqCst), "client session must be Handshaked once connect() returns");

    session.send(b"test".to_vec()).await.unwrap();
    wait_until(|| received.load(Ordering::SeqCst) == 4).await;
    assert!(handshaked_first.load(Ordering::SeqCst));

    client.disconnect().await;
    wait_until(|| server.session_count() == 0).await;
    server.stop().await;
}
