//! # netcore-unix
//!
//! UNIX domain socket byte-stream transport: [`UnixServer`]/[`UnixClient`]
//! drive `netcore-core`'s generic `ServerCore`/`ClientCore` over
//! `tokio::net::UnixStream`. A stale socket file left over from a
//! previous, uncleanly terminated server is removed before binding, and
//! the file is removed again on acceptor drop.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod client;
mod config;
mod server;

pub use client::{UnixClient, UnixConnector};
pub use config::{UnixConfig, UnixConfigBuilder};
pub use server::{UnixAcceptor, UnixServer};
