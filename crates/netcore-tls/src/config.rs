//! TLS configuration: the consumer supplies a prepared `rustls` config.
//!
//! Per spec.md §1's non-goals ("no TLS certificate authority logic —
//! consumers supply a prepared TLS configuration"), this crate never
//! builds a trust store or loads certificates itself; it only drives the
//! handshake and record I/O around whatever `rustls::ServerConfig`/
//! `rustls::ClientConfig` the caller already assembled.

use std::sync::Arc;

/// Server-side TLS configuration: a ready-to-use `rustls::ServerConfig`
/// (certificate chain, private key, and any ALPN/version policy already
/// baked in by the caller).
#[derive(Debug, Clone)]
pub struct TlsServerConfig {
    pub(crate) inner: Arc<rustls::ServerConfig>,
}

impl TlsServerConfig {
    /// Wrap an already-built `rustls::ServerConfig`.
    #[must_use]
    pub fn new(config: Arc<rustls::ServerConfig>) -> Self {
        Self { inner: config }
    }
}

impl From<rustls::ServerConfig> for TlsServerConfig {
    fn from(config: rustls::ServerConfig) -> Self {
        Self::new(Arc::new(config))
    }
}

impl From<Arc<rustls::ServerConfig>> for TlsServerConfig {
    fn from(config: Arc<rustls::ServerConfig>) -> Self {
        Self::new(config)
    }
}

/// Client-side TLS configuration: a ready-to-use `rustls::ClientConfig`
/// (trust store and certificate validation policy already baked in by
/// the caller) plus the server name used for SNI and certificate
/// verification.
#[derive(Debug, Clone)]
pub struct TlsClientConfig {
    pub(crate) inner: Arc<rustls::ClientConfig>,
    pub(crate) server_name: String,
}

impl TlsClientConfig {
    /// Wrap an already-built `rustls::ClientConfig`, pinning the server
    /// name used for SNI/certificate verification.
    #[must_use]
    pub fn new(config: Arc<rustls::ClientConfig>, server_name: impl Into<String>) -> Self {
        Self {
            inner: config,
            server_name: server_name.into(),
        }
    }
}
