//! Parsed HTTP message types (spec.md §3).

use bytes::Bytes;

/// The HTTP version on a request's request-line or a response's status-line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    /// `HTTP/1.0`
    Http10,
    /// `HTTP/1.1`
    Http11,
}

impl HttpVersion {
    /// The exact wire token, used on send (spec.md §4.6: "strict CRLF
    /// emission" extends to emitting the version we were actually given).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }
}

impl std::str::FromStr for HttpVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP/1.0" => Ok(HttpVersion::Http10),
            "HTTP/1.1" => Ok(HttpVersion::Http11),
            _ => Err(()),
        }
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A parsed HTTP request (spec.md §3).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Request target as it appeared on the request-line.
    pub url: String,
    /// Declared HTTP version.
    pub version: HttpVersion,
    /// Header pairs in wire order.
    pub headers: Vec<(String, String)>,
    /// The assembled body, per spec.md §4.6's framing precedence.
    pub body: Bytes,
    /// The raw bytes this request was parsed from (head + body).
    pub raw: Bytes,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A parsed HTTP response (spec.md §3).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Declared HTTP version.
    pub version: HttpVersion,
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase, e.g. `"OK"`.
    pub reason: String,
    /// Header pairs in wire order.
    pub headers: Vec<(String, String)>,
    /// The assembled body, per spec.md §4.6's framing precedence.
    pub body: Bytes,
    /// The raw bytes this response was parsed from (head + body). Empty
    /// for responses built with a [`crate::builders`] helper rather than
    /// parsed off the wire.
    pub raw: Bytes,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A message emitted by [`crate::codec::HttpCodec::feed`], tagged by the
/// role the codec was constructed with.
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    /// The codec is in [`crate::codec::Role::Server`] mode.
    Request(HttpRequest),
    /// The codec is in [`crate::codec::Role::Client`] mode.
    Response(HttpResponse),
}
