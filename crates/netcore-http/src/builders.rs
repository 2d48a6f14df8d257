//! Response builder helpers (spec.md §4.6), exact analogues of the
//! source's `MakeXxxResponse` family.

use bytes::Bytes;

use crate::types::{HttpRequest, HttpResponse, HttpVersion};

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Standard reason phrase for the status codes this library's demo
/// surfaces actually produce. Anything else falls back to `"Unknown"`.
#[must_use]
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        426 => "Upgrade Required",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        101 => "Switching Protocols",
        _ => "Unknown",
    }
}

fn response(status: u16, content_type: &str, body: impl Into<Bytes>) -> HttpResponse {
    let body = body.into();
    HttpResponse {
        version: HttpVersion::Http11,
        status,
        reason: reason_phrase(status).to_string(),
        headers: vec![
            ("Content-Type".to_string(), content_type.to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
        body,
        raw: Bytes::new(),
    }
}

/// `HEAD` response: identical headers to what a `GET` would produce, but
/// with the body stripped (the caller still passes `body` so
/// `Content-Length` reflects the resource's true size).
#[must_use]
pub fn make_head_response(body: impl Into<Bytes>) -> HttpResponse {
    let mut resp = response(200, DEFAULT_CONTENT_TYPE, body);
    resp.body = Bytes::new();
    resp
}

/// `200 OK` with `body` and the default content type.
#[must_use]
pub fn make_get_response(body: impl Into<Bytes>) -> HttpResponse {
    response(200, DEFAULT_CONTENT_TYPE, body)
}

/// `200 OK` with `body` and an explicit content type.
#[must_use]
pub fn make_get_response_with_content_type(body: impl Into<Bytes>, content_type: &str) -> HttpResponse {
    response(200, content_type, body)
}

/// `200 OK` with an empty body, for handlers that only need to
/// acknowledge success (e.g. `POST`/`PUT`/`DELETE` in the CRUD demo).
#[must_use]
pub fn make_ok_response() -> HttpResponse {
    response(200, DEFAULT_CONTENT_TYPE, Bytes::new())
}

/// `500 Internal Server Error` with `message` as the body.
#[must_use]
pub fn make_error_response(message: impl Into<Bytes>) -> HttpResponse {
    response(500, DEFAULT_CONTENT_TYPE, message)
}

/// An error response with an explicit status code (used by the CRUD demo
/// for the `404 Not Found` convention, spec.md §9 Open Questions #1).
#[must_use]
pub fn make_error_response_with_status(status: u16, message: impl Into<Bytes>) -> HttpResponse {
    response(status, DEFAULT_CONTENT_TYPE, message)
}

/// `200 OK` response to an `OPTIONS` request, advertising the methods this
/// library's demo surface supports.
#[must_use]
pub fn make_options_response() -> HttpResponse {
    let mut resp = response(200, DEFAULT_CONTENT_TYPE, Bytes::new());
    resp.headers
        .push(("Allow".to_string(), "GET, HEAD, POST, PUT, DELETE, OPTIONS, TRACE".to_string()));
    resp
}

/// `200 OK` response to a `TRACE` request, echoing the raw request bytes
/// back as the body with `Content-Type: message/http`, per RFC 7231 §4.3.8.
#[must_use]
pub fn make_trace_response(raw_request: &HttpRequest) -> HttpResponse {
    response(200, "message/http", raw_request.raw.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_response_sets_content_length() {
        let resp = make_get_response(Bytes::from_static(b"hello"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Content-Length"), Some("5"));
    }

    #[test]
    fn error_response_with_status_uses_custom_code() {
        let resp = make_error_response_with_status(404, "not found");
        assert_eq!(resp.status, 404);
        assert_eq!(resp.reason, "Not Found");
    }

    #[test]
    fn head_response_strips_body_but_keeps_length() {
        let resp = make_head_response(Bytes::from_static(b"hello"));
        assert!(resp.body.is_empty());
        assert_eq!(resp.header("Content-Length"), Some("5"));
    }
}
