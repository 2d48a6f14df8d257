//! The RFC 6455 upgrade handshake, riding on top of `netcore-http`'s
//! [`HttpCodec`] exactly as spec.md §4.7 describes: "Server: on first HTTP
//! request... Client: generate 16 random nonce bytes...".

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use netcore_core::{Error, ErrorKind, Result};
use netcore_http::{HttpRequest, HttpResponse, HttpVersion};
use sha1::{Digest, Sha1};

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// `base64(sha1(client_key + magic guid))`, per spec.md §4.7.
#[must_use]
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// 16 random nonce bytes, base64-encoded, for `Sec-WebSocket-Key`.
#[must_use]
pub fn generate_client_key() -> String {
    let mut nonce = [0u8; 16];
    for b in &mut nonce {
        *b = fastrand::u8(..);
    }
    BASE64.encode(nonce)
}

/// Verify `req` carries a compliant upgrade request and return its
/// `Sec-WebSocket-Key`.
pub fn validate_upgrade_request(req: &HttpRequest) -> Result<String> {
    let upgrade_ok = req
        .header("Upgrade")
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    let connection_ok = req
        .header("Connection")
        .is_some_and(|v| v.to_ascii_lowercase().split(',').any(|tok| tok.trim() == "upgrade"));
    let version_ok = req.header("Sec-WebSocket-Version") == Some("13");
    if !upgrade_ok || !connection_ok || !version_ok {
        return Err(Error::new(ErrorKind::WsProtocol, "missing or invalid websocket upgrade headers"));
    }
    req.header("Sec-WebSocket-Key")
        .map(str::to_string)
        .ok_or_else(|| Error::new(ErrorKind::WsProtocol, "missing Sec-WebSocket-Key"))
}

/// Build the `101 Switching Protocols` response for a validated upgrade
/// request.
#[must_use]
pub fn upgrade_response(client_key: &str) -> HttpResponse {
    HttpResponse {
        version: HttpVersion::Http11,
        status: 101,
        reason: "Switching Protocols".to_string(),
        headers: vec![
            ("Upgrade".to_string(), "websocket".to_string()),
            ("Connection".to_string(), "Upgrade".to_string()),
            ("Sec-WebSocket-Accept".to_string(), accept_key(client_key)),
        ],
        body: bytes::Bytes::new(),
        raw: bytes::Bytes::new(),
    }
}

/// Build the client's `GET` upgrade request.
#[must_use]
pub fn upgrade_request(host: &str, path: &str, client_key: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".to_string(),
        url: path.to_string(),
        version: HttpVersion::Http11,
        headers: vec![
            ("Host".to_string(), host.to_string()),
            ("Upgrade".to_string(), "websocket".to_string()),
            ("Connection".to_string(), "Upgrade".to_string()),
            ("Sec-WebSocket-Key".to_string(), client_key.to_string()),
            ("Sec-WebSocket-Version".to_string(), "13".to_string()),
        ],
        body: bytes::Bytes::new(),
        raw: bytes::Bytes::new(),
    }
}

/// Verify the server's response completes the handshake `client_key`
/// started.
pub fn validate_upgrade_response(resp: &HttpResponse, client_key: &str) -> Result<()> {
    if resp.status != 101 {
        return Err(Error::new(ErrorKind::WsProtocol, "server did not switch protocols"));
    }
    let expected = accept_key(client_key);
    match resp.header("Sec-WebSocket-Accept") {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(Error::new(ErrorKind::WsProtocol, "Sec-WebSocket-Accept did not match the expected value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_key_matches_the_rfc_6455_example() {
        // RFC 6455 §1.3's worked example.
        assert_eq!(accept_key("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn server_response_validates_against_the_client_key() {
        let key = generate_client_key();
        let resp = upgrade_response(&key);
        assert!(validate_upgrade_response(&resp, &key).is_ok());
    }

    #[test]
    fn response_is_rejected_for_a_different_key() {
        let resp = upgrade_response("dGhlIHNhbXBsZSBub25jZQ==");
        assert!(validate_upgrade_response(&resp, "a-different-key").is_err());
    }
}
