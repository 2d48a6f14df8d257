//! Incremental HTTP/1.1 request/response parser (spec.md §4.6).
//!
//! Hand-rolled rather than built on `httparse`: HTTP framing is one of the
//! two "nontrivial stateful codecs" this library implements itself. The
//! parser accepts CRLF or bare LF line terminators on receive (liberal) and
//! never needs to emit on its own — encoding is the separate, strict-CRLF
//! [`crate::builders`] surface.

use bytes::{Buf, Bytes, BytesMut};
use netcore_core::{Error, ErrorKind, Result};

use crate::types::{HttpRequest, HttpResponse, HttpVersion, ParsedMessage};

/// Which side of the connection a [`HttpCodec`] is parsing for: a server
/// parses requests, a client parses responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Parse incoming bytes as HTTP requests.
    Server,
    /// Parse incoming bytes as HTTP responses.
    Client,
}

#[derive(Debug, Clone)]
struct Head {
    method: String,
    url: String,
    version: HttpVersion,
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
    head_bytes: Bytes,
}

#[derive(Debug)]
enum ChunkPhase {
    Size,
    Data(usize),
    DataCrlf,
    TrailerEnd,
}

#[derive(Debug)]
enum BodyState {
    Fixed { remaining: usize, collected: BytesMut },
    Chunked { phase: ChunkPhase, collected: BytesMut },
    UntilClose { collected: BytesMut },
}

#[derive(Debug)]
enum State {
    Header,
    Body(Head, BodyState),
}

/// Incremental parser, fed bytes as they arrive off a [`netcore_core::Session`]
/// receive callback; emits zero or more completed messages per call.
#[derive(Debug)]
pub struct HttpCodec {
    role: Role,
    buffer: BytesMut,
    state: State,
}

impl HttpCodec {
    /// Construct a fresh codec for `role`.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            buffer: BytesMut::new(),
            state: State::Header,
        }
    }

    /// Feed newly received bytes, returning every message that became
    /// complete as a result (usually zero or one; more than one when
    /// several pipelined messages arrived in the same receive completion).
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<ParsedMessage>> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(msg) = self.step()? {
            out.push(msg);
        }
        Ok(out)
    }

    /// Signal that the peer closed the connection. Completes a
    /// response body framed `UntilClose`; a no-op otherwise.
    pub fn finish_on_eof(&mut self) -> Result<Option<ParsedMessage>> {
        if let State::Body(_, BodyState::UntilClose { .. }) = &self.state {
            let State::Body(head, BodyState::UntilClose { collected }) =
                std::mem::replace(&mut self.state, State::Header)
            else {
                unreachable!()
            };
            return Ok(Some(Self::finish_message(head, collected.freeze())));
        }
        Ok(None)
    }

    fn step(&mut self) -> Result<Option<ParsedMessage>> {
        match &mut self.state {
            State::Header => self.step_header(),
            State::Body(..) => self.step_body(),
        }
    }

    fn step_header(&mut self) -> Result<Option<ParsedMessage>> {
        let Some(end) = find_header_end(&self.buffer) else {
            return Ok(None);
        };
        let head_bytes = self.buffer.split_to(end).freeze();
        let text = std::str::from_utf8(&head_bytes)
            .map_err(|_| Error::new(ErrorKind::HttpMalformed, "header block is not valid utf-8"))?;

        let mut lines = text.split('\n').map(|l| l.trim_end_matches('\r'));
        let start_line = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| Error::new(ErrorKind::HttpMalformed, "missing start line"))?;

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::new(ErrorKind::HttpMalformed, "malformed header line"))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let head = match self.role {
            Role::Server => {
                let mut parts = start_line.split(' ');
                let method = parts.next().unwrap_or_default().to_string();
                let url = parts
                    .next()
                    .ok_or_else(|| Error::new(ErrorKind::HttpMalformed, "missing request target"))?
                    .to_string();
                let version_str = parts.next().unwrap_or("HTTP/1.1");
                let version = version_str
                    .parse()
                    .map_err(|()| Error::new(ErrorKind::HttpMalformed, "unsupported HTTP version"))?;
                if method.is_empty() {
                    return Err(Error::new(ErrorKind::HttpMalformed, "missing request method"));
                }
                Head {
                    method,
                    url,
                    version,
                    status: 0,
                    reason: String::new(),
                    headers,
                    head_bytes,
                }
            }
            Role::Client => {
                let mut parts = start_line.splitn(3, ' ');
                let version_str = parts.next().unwrap_or("HTTP/1.1");
                let version = version_str
                    .parse()
                    .map_err(|()| Error::new(ErrorKind::HttpMalformed, "unsupported HTTP version"))?;
                let status: u16 = parts
                    .next()
                    .ok_or_else(|| Error::new(ErrorKind::HttpMalformed, "missing status code"))?
                    .parse()
                    .map_err(|_| Error::new(ErrorKind::HttpMalformed, "status code not numeric"))?;
                let reason = parts.next().unwrap_or("").to_string();
                Head {
                    method: String::new(),
                    url: String::new(),
                    version,
                    status,
                    reason,
                    headers,
                    head_bytes,
                }
            }
        };

        let body_state = self.classify_body(&head)?;
        match body_state {
            None => Ok(Some(Self::finish_message(head, Bytes::new()))),
            Some(body_state) => {
                self.state = State::Body(head, body_state);
                self.step_body()
            }
        }
    }

    fn classify_body(&self, head: &Head) -> Result<Option<BodyState>> {
        let chunked = head
            .headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("transfer-encoding") && v.to_ascii_lowercase().contains("chunked"));
        if chunked {
            return Ok(Some(BodyState::Chunked {
                phase: ChunkPhase::Size,
                collected: BytesMut::new(),
            }));
        }

        if let Some((_, v)) = head.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case("content-length")) {
            let n: usize = v
                .trim()
                .parse()
                .map_err(|_| Error::new(ErrorKind::HttpMalformed, "content-length not numeric"))?;
            if n == 0 {
                return Ok(None);
            }
            return Ok(Some(BodyState::Fixed {
                remaining: n,
                collected: BytesMut::with_capacity(n),
            }));
        }

        // No Content-Length, no chunked: a request has no body; a response's
        // body runs until the connection closes (spec.md §4.6 precedence #3).
        match self.role {
            Role::Server => Ok(None),
            Role::Client => Ok(Some(BodyState::UntilClose { collected: BytesMut::new() })),
        }
    }

    fn step_body(&mut self) -> Result<Option<ParsedMessage>> {
        let State::Body(_, body_state) = &mut self.state else {
            unreachable!()
        };
        match body_state {
            BodyState::Fixed { remaining, .. } => {
                if self.buffer.len() < *remaining {
                    return Ok(None);
                }
                let State::Body(head, BodyState::Fixed { remaining, mut collected }) =
                    std::mem::replace(&mut self.state, State::Header)
                else {
                    unreachable!()
                };
                collected.extend_from_slice(&self.buffer.split_to(remaining));
                Ok(Some(Self::finish_message(head, collected.freeze())))
            }
            BodyState::Chunked { .. } => self.step_chunked(),
            BodyState::UntilClose { .. } => Ok(None),
        }
    }

    fn step_chunked(&mut self) -> Result<Option<ParsedMessage>> {
        loop {
            let State::Body(_, BodyState::Chunked { phase, .. }) = &self.state else {
                unreachable!()
            };
            match phase {
                ChunkPhase::Size => {
                    let Some(line_end) = find_line_end(&self.buffer) else {
                        return Ok(None);
                    };
                    let line = self.buffer.split_to(line_end);
                    let line = trim_line(&line);
                    let size_str = line.split(';').next().unwrap_or("").trim();
                    let size = usize::from_str_radix(size_str, 16)
                        .map_err(|_| Error::new(ErrorKind::HttpMalformed, "bad chunk size"))?;

                    let State::Body(_, BodyState::Chunked { phase, .. }) = &mut self.state else {
                        unreachable!()
                    };
                    *phase = if size == 0 {
                        ChunkPhase::TrailerEnd
                    } else {
                        ChunkPhase::Data(size)
                    };
                }
                ChunkPhase::Data(size) => {
                    let size = *size;
                    if self.buffer.len() < size {
                        return Ok(None);
                    }
                    let chunk = self.buffer.split_to(size);
                    let State::Body(_, BodyState::Chunked { phase, collected }) = &mut self.state else {
                        unreachable!()
                    };
                    collected.extend_from_slice(&chunk);
                    *phase = ChunkPhase::DataCrlf;
                }
                ChunkPhase::DataCrlf => {
                    let Some(line_end) = find_line_end(&self.buffer) else {
                        return Ok(None);
                    };
                    self.buffer.advance(line_end);
                    let State::Body(_, BodyState::Chunked { phase, .. }) = &mut self.state else {
                        unreachable!()
                    };
                    *phase = ChunkPhase::Size;
                }
                ChunkPhase::TrailerEnd => {
                    let Some(end) = find_header_end(&self.buffer) else {
                        // Also accept a bare final line terminator with no trailers.
                        let Some(line_end) = find_line_end(&self.buffer) else {
                            return Ok(None);
                        };
                        self.buffer.advance(line_end);
                        let State::Body(head, BodyState::Chunked { collected, .. }) =
                            std::mem::replace(&mut self.state, State::Header)
                        else {
                            unreachable!()
                        };
                        return Ok(Some(Self::finish_message(head, collected.freeze())));
                    };
                    self.buffer.advance(end);
                    let State::Body(head, BodyState::Chunked { collected, .. }) =
                        std::mem::replace(&mut self.state, State::Header)
                    else {
                        unreachable!()
                    };
                    return Ok(Some(Self::finish_message(head, collected.freeze())));
                }
            }
        }
    }

    fn finish_message(head: Head, body: Bytes) -> ParsedMessage {
        let mut raw = BytesMut::with_capacity(head.head_bytes.len() + body.len());
        raw.extend_from_slice(&head.head_bytes);
        raw.extend_from_slice(&body);
        let raw = raw.freeze();

        if head.method.is_empty() {
            ParsedMessage::Response(HttpResponse {
                version: head.version,
                status: head.status,
                reason: head.reason,
                headers: head.headers,
                body,
                raw,
            })
        } else {
            ParsedMessage::Request(HttpRequest {
                method: head.method,
                url: head.url,
                version: head.version,
                headers: head.headers,
                body,
                raw,
            })
        }
    }
}

/// Serialize a response to wire bytes. Always emits CRLF, regardless of
/// what the codec accepted on receive (spec.md §4.6: "strict CRLF
/// emission").
#[must_use]
pub fn encode_response(resp: &HttpResponse) -> Bytes {
    let mut out = BytesMut::new();
    out.extend_from_slice(format!("{} {} {}\r\n", resp.version.as_str(), resp.status, resp.reason).as_bytes());
    for (name, value) in &resp.headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&resp.body);
    out.freeze()
}

/// Serialize a request to wire bytes, CRLF-terminated.
#[must_use]
pub fn encode_request(req: &HttpRequest) -> Bytes {
    let mut out = BytesMut::new();
    out.extend_from_slice(format!("{} {} {}\r\n", req.method, req.url, req.version.as_str()).as_bytes());
    for (name, value) in &req.headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&req.body);
    out.freeze()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
        .or_else(|| buf.windows(2).position(|w| w == b"\n\n").map(|p| p + 2))
}

/// Position just past the next line terminator (CRLF or bare LF).
fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|p| p + 1)
}

fn trim_line(line: &[u8]) -> &str {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    std::str::from_utf8(line).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_request_with_content_length() {
        let mut codec = HttpCodec::new(Role::Server);
        let msgs = codec
            .feed(b"POST /test HTTP/1.1\r\nContent-Length: 9\r\n\r\nold_value")
            .unwrap();
        assert_eq!(msgs.len(), 1);
        let ParsedMessage::Request(req) = &msgs[0] else { panic!("expected request") };
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "/test");
        assert_eq!(&req.body[..], b"old_value");
    }

    #[test]
    fn parses_request_across_multiple_feeds() {
        let mut codec = HttpCodec::new(Role::Server);
        assert!(codec.feed(b"GET /test HTTP/1.1\r\n").unwrap().is_empty());
        assert!(codec.feed(b"Content-Length: 0\r\n").unwrap().is_empty());
        let msgs = codec.feed(b"\r\n").unwrap();
        assert_eq!(msgs.len(), 1);
        let ParsedMessage::Request(req) = &msgs[0] else { panic!("expected request") };
        assert_eq!(req.method, "GET");
        assert!(req.body.is_empty());
    }

    #[test]
    fn parses_chunked_body() {
        let mut codec = HttpCodec::new(Role::Server);
        let wire = b"POST /t HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntest\r\n0\r\n\r\n";
        let msgs = codec.feed(wire).unwrap();
        assert_eq!(msgs.len(), 1);
        let ParsedMessage::Request(req) = &msgs[0] else { panic!("expected request") };
        assert_eq!(&req.body[..], b"test");
    }

    #[test]
    fn parses_response_status_line() {
        let mut codec = HttpCodec::new(Role::Client);
        let msgs = codec
            .feed(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok")
            .unwrap();
        assert_eq!(msgs.len(), 1);
        let ParsedMessage::Response(resp) = &msgs[0] else { panic!("expected response") };
        assert_eq!(resp.status, 200);
        assert_eq!(resp.reason, "OK");
        assert_eq!(&resp.body[..], b"ok");
    }

    #[test]
    fn accepts_bare_lf_line_terminators() {
        let mut codec = HttpCodec::new(Role::Server);
        let msgs = codec.feed(b"GET / HTTP/1.1\nContent-Length: 0\n\n").unwrap();
        assert_eq!(msgs.len(), 1);
    }

    #[test]
    fn encode_response_emits_crlf() {
        let resp = crate::builders::make_ok_response();
        let wire = encode_response(&resp);
        assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(wire.ends_with(b"\r\n"));
    }

    #[test]
    fn pipelined_requests_both_emitted() {
        let mut codec = HttpCodec::new(Role::Server);
        let wire = b"GET /a HTTP/1.1\r\nContent-Length: 0\r\n\r\nGET /b HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        let msgs = codec.feed(wire).unwrap();
        assert_eq!(msgs.len(), 2);
    }
}
