//! UDP multicast scenario: spec.md §8 scenario 3 — several listeners join
//! one multicast group and each independently receives a single multicast
//! datagram.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netcore_udp::{DatagramContext, DatagramEngine, DatagramHandler, UdpConfigBuilder};
use tokio::time::timeout;

const GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 0, 1);
const PORT: u16 = 3335;

struct Counting {
    received: Arc<AtomicUsize>,
}

impl DatagramHandler for Counting {
    fn on_received(&self, _ctx: &DatagramContext, _peer: SocketAddr, bytes: &[u8]) {
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
async fn multicast_group_fan_out() {
    let config = UdpConfigBuilder::new().reuse_address(true).build();

    let counts: Vec<_> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let listeners: Vec<_> = counts
        .iter()
        .map(|count| {
            DatagramEngine::multicast(
                GROUP,
                PORT,
                config,
                Counting { received: count.clone() },
            )
            .expect("multicast bind")
        })
        .collect();

    // Sender does not join the group, only needs an ephemeral unicast socket.
    let sender = DatagramEngine::bind(
        "0.0.0.0:0".parse().unwrap(),
        config,
        Counting { received: Arc::new(AtomicUsize::new(0)) },
    )
    .unwrap();

    sender
        .send(SocketAddr::V4(SocketAddrV4::new(GROUP, PORT)), b"test".to_vec())
        .await
        .unwrap();

    for count in &counts {
        let count = count.clone();
        wait_until(|| count.load(Ordering::SeqCst) == 4).await;
    }

    for listener in &listeners {
        listener.leave_multicast(GROUP).unwrap();
    }
}
