//! # netcore-udp
//!
//! Connectionless datagram transport for `netcore`: unicast UDP and IPv4
//! multicast, built on [`netcore_core`]'s error taxonomy and counters but
//! not its session engine, since UDP carries no per-peer connection state
//! or delivery order to track (spec.md §4.3).
//!
//! [`DatagramEngine`] owns one bound socket and one background task that
//! enforces the same single-outstanding-receive invariant
//! `netcore_core::Session` gives TCP/TLS/UNIX streams; `send_async` queues
//! one datagram at a time with no ordering promise across calls.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod config;
mod engine;
mod handler;

pub use config::{UdpConfig, UdpConfigBuilder};
pub use engine::{DatagramContext, DatagramEngine};
pub use handler::DatagramHandler;
