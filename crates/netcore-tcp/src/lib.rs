//! # netcore-tcp
//!
//! TCP byte-stream transport: [`TcpServer`]/[`TcpClient`] drive
//! `netcore-core`'s generic `ServerCore`/`ClientCore` over
//! `tokio::net::TcpStream`, with the full socket-option surface of
//! spec.md §6 (keepalive, no-delay, reuse-address/port, dual-stack,
//! buffer sizes, backlog) applied via `socket2` before a socket is ever
//! handed to the session engine.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod client;
mod config;
mod server;
mod socket;

pub use client::{TcpClient, TcpConnector};
pub use config::{TcpConfig, TcpConfigBuilder};
pub use server::{TcpAcceptor, TcpServer};
