//! # netcore-tls
//!
//! TLS-over-TCP transport: [`TlsServer`]/[`TlsClient`] wrap every
//! accepted/outgoing TCP stream in a `rustls` handshake via
//! `tokio-rustls`, then hand the resulting [`tokio_rustls::TlsStream`] to
//! `netcore-core`'s [`netcore_core::Session`] exactly as `netcore-tcp`
//! hands it a bare [`tokio::net::TcpStream`] — TLS is a transparent
//! stream transformation (spec.md §4.2), not a parallel session engine.
//!
//! Per spec.md §1's non-goals, this crate performs no certificate
//! authority logic: callers supply an already-built `rustls::ServerConfig`
//! / `rustls::ClientConfig` via [`TlsServerConfig`]/[`TlsClientConfig`].
//!
//! The "writes before handshake" open question (spec.md §4.2, §9) is
//! resolved structurally here: because `tokio_rustls` completes the
//! handshake before the socket is ever handed to
//! [`netcore_core::Session::connect`], the session transitions straight
//! to `Handshaked` (via [`netcore_core::Listener::requires_handshake`] /
//! [`netcore_core::Connector::requires_handshake`]) immediately after
//! `on_connected`, so ordinary `send()` calls issued after `connect()`
//! returns always see a handshaked session.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod client;
mod config;
mod server;

pub use client::{TlsClient, TlsConnector};
pub use config::{TlsClientConfig, TlsServerConfig};
pub use server::{TlsAcceptor, TlsServer};
