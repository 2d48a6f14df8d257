//! # netcore
//!
//! Asynchronous, high-throughput socket library: connected byte-stream
//! (TCP), encrypted byte-stream (TLS over TCP), connectionless datagram
//! (UDP, including IP multicast), and local byte-stream (UNIX domain
//! socket) transports, plus two framed overlays built on the byte-stream
//! transport: HTTP/1.1 request/response and RFC 6455 WebSocket.
//!
//! This crate carries no logic of its own: it re-exports the six
//! transport-layer crates behind matching cargo features, mirroring the
//! shape of [`netcore_core`] (the foundation layer every other crate
//! builds on — session identity, the ordered send pipeline, the
//! server/client registries — always available regardless of which
//! transport features are enabled).
//!
//! | Feature | Re-exports | Depends on |
//! |---|---|---|
//! | `tcp` | [`netcore_tcp`] | — |
//! | `unix` | [`netcore_unix`] | — |
//! | `tls` | [`netcore_tls`] | `tcp` |
//! | `udp` | [`netcore_udp`] | — |
//! | `http` | [`netcore_http`] | `tcp` |
//! | `ws` | [`netcore_ws`] | `http` |
//!
//! All six are enabled by default. Pick a transport crate directly (or
//! via [`prelude`]) rather than going through `netcore::` paths if a
//! project only ever needs one protocol family — the per-crate
//! dependency footprint is the same either way.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

pub use netcore_core as core;

#[cfg(feature = "tcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "tcp")))]
pub use netcore_tcp as tcp;

#[cfg(feature = "unix")]
#[cfg_attr(docsrs, doc(cfg(feature = "unix")))]
pub use netcore_unix as unix;

#[cfg(feature = "tls")]
#[cfg_attr(docsrs, doc(cfg(feature = "tls")))]
pub use netcore_tls as tls;

#[cfg(feature = "udp")]
#[cfg_attr(docsrs, doc(cfg(feature = "udp")))]
pub use netcore_udp as udp;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub use netcore_http as http;

#[cfg(feature = "ws")]
#[cfg_attr(docsrs, doc(cfg(feature = "ws")))]
pub use netcore_ws as ws;

/// Re-exports of the most commonly reached-for items across every
/// enabled transport, for `use netcore::prelude::*;`.
pub mod prelude {
    pub use netcore_core::{Buffer, Error, ErrorKind, Handler, Id, Result, Session, SessionContext};

    #[cfg(feature = "tcp")]
    pub use netcore_tcp::{TcpAcceptor, TcpClient, TcpConfig, TcpConnector, TcpServer};

    #[cfg(feature = "unix")]
    pub use netcore_unix::{UnixAcceptor, UnixClient, UnixConfig, UnixConnector, UnixServer};

    #[cfg(feature = "tls")]
    pub use netcore_tls::{TlsAcceptor, TlsClient, TlsClientConfig, TlsConnector, TlsServer, TlsServerConfig};

    #[cfg(feature = "udp")]
    pub use netcore_udp::{DatagramContext, DatagramEngine, DatagramHandler, UdpConfig};

    #[cfg(feature = "http")]
    pub use netcore_http::{HttpClient, HttpContext, HttpHandler, HttpRequest, HttpResponse, HttpServer};

    #[cfg(feature = "ws")]
    pub use netcore_ws::{WsClient, WsContext, WsHandler, WsServer};
}

/// Runtime transport-feature detection, for code that needs to branch on
/// which protocol families this build of the crate was compiled with.
#[derive(Debug)]
pub struct Features;

impl Features {
    /// Whether the `tcp` feature is enabled.
    #[must_use]
    pub const fn has_tcp() -> bool {
        cfg!(feature = "tcp")
    }

    /// Whether the `unix` feature is enabled.
    #[must_use]
    pub const fn has_unix() -> bool {
        cfg!(feature = "unix")
    }

    /// Whether the `tls` feature is enabled.
    #[must_use]
    pub const fn has_tls() -> bool {
        cfg!(feature = "tls")
    }

    /// Whether the `udp` feature is enabled.
    #[must_use]
    pub const fn has_udp() -> bool {
        cfg!(feature = "udp")
    }

    /// Whether the `http` feature is enabled.
    #[must_use]
    pub const fn has_http() -> bool {
        cfg!(feature = "http")
    }

    /// Whether the `ws` feature is enabled.
    #[must_use]
    pub const fn has_ws() -> bool {
        cfg!(feature = "ws")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_enable_every_transport() {
        assert!(Features::has_tcp());
        assert!(Features::has_unix());
        assert!(Features::has_tls());
        assert!(Features::has_udp());
        assert!(Features::has_http());
        assert!(Features::has_ws());
    }
}
