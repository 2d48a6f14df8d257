//! # netcore-core
//!
//! Foundation layer shared by every `netcore` transport crate: session
//! identity, the byte [`Buffer`], the error taxonomy, the generic
//! [`Handler`] callback surface, the asynchronous [`session::Session`]
//! engine (the two-buffer ordered send pipeline and single-outstanding
//! receive loop), the [`registry::Registry`]/[`server::ServerCore`]/
//! [`client::ClientCore`] generics that `netcore-tcp`, `netcore-unix`, and
//! `netcore-tls` build their protocol-specific listeners and connectors
//! on top of, plus the small [`dns::DnsFacade`] and [`timer::TimerFacade`]
//! helpers.
//!
//! Nothing in this crate knows about TCP, UNIX sockets, TLS, HTTP, or
//! WebSocket; it only knows how to drive an `AsyncRead + AsyncWrite`
//! socket once one is handed to it.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod buffer;
mod client;
mod dns;
mod error;
mod handler;
mod id;
mod metrics;
mod registry;
mod server;
mod session;
mod timer;

pub use buffer::Buffer;
pub use client::{ClientCore, Connector, ReconnectHandler, RECONNECT_DELAY};
pub use dns::DnsFacade;
pub use error::{is_retryable, Error, ErrorKind, Result};
pub use handler::Handler;
pub use id::{Id, ParseIdError};
pub use metrics::{Counters, CountersSnapshot};
pub use registry::Registry;
pub use server::{Listener, ServerCore};
pub use session::{Session, SessionContext, SessionState, DEFAULT_RECEIVE_BUFFER_SIZE};
pub use timer::TimerFacade;
