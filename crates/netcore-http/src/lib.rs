//! # netcore-http
//!
//! Incremental HTTP/1.1 request/response codec (spec.md §4.6) layered over
//! any `netcore-core` byte-stream session, plus the response-builder family
//! and the static-file-serving cache (spec.md §4.8) used by HTTP servers.
//!
//! Nothing here talks to a socket directly: [`HttpServer`] drives a
//! `netcore-core::ServerCore` over whatever [`netcore_core::Listener`] it is
//! given (plain TCP via `netcore-tcp`, UNIX via `netcore-unix`, or
//! TLS-wrapped via `netcore-tls`), and [`HttpClient`] does the same over a
//! [`netcore_core::Connector`]. This crate only owns HTTP framing.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

mod builders;
mod client;
mod codec;
mod handler;
mod server;
mod session;
mod static_cache;
mod types;

pub use builders::{
    make_error_response, make_error_response_with_status, make_get_response,
    make_get_response_with_content_type, make_head_response, make_ok_response,
    make_options_response, make_trace_response, reason_phrase,
};
pub use client::HttpClient;
pub use codec::{encode_request, encode_response, HttpCodec, Role};
pub use handler::{HttpContext, HttpHandler, StaticCacheHandle};
pub use server::HttpServer;
pub use static_cache::{StaticContentCache, DEFAULT_REFRESH_INTERVAL};
pub use types::{HttpRequest, HttpResponse, HttpVersion, ParsedMessage};
