//! # netcore-ws
//!
//! RFC 6455 WebSocket framing (spec.md §4.7) layered over `netcore-http`'s
//! upgrade handshake, itself layered over any `netcore-core` byte-stream
//! session.
//!
//! [`WsServer`] drives a `netcore-core::ServerCore` over whatever
//! [`netcore_core::Listener`] it is given (plain TCP, UNIX, or
//! TLS-wrapped), and [`WsClient`] does the same over a
//! [`netcore_core::Connector`]. Both hand each accepted/connected session
//! to a [`session::WsSession`], which negotiates the upgrade handshake via
//! `netcore-http`'s [`netcore_http::HttpCodec`] and then switches to frame
//! mode.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod client;
mod codec;
mod handler;
mod handshake;
mod server;
mod session;
mod types;

pub use client::WsClient;
pub use codec::{encode_binary, encode_close, encode_frame, encode_ping, encode_pong, encode_text, Role, WsCodec};
pub use handler::{WsContext, WsHandler};
pub use handshake::{accept_key, generate_client_key};
pub use server::WsServer;
pub use types::{WsFrame, WsMessage, WsOpcode};
