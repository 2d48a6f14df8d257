//! Error taxonomy shared by every netcore transport crate.

use thiserror::Error;

/// A specialized `Result` type for netcore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure behind an [`Error`], independent of the message.
///
/// This enumerates exactly the taxonomy netcore's design calls for: bind
/// failures, connect/transport failures, TLS failures, HTTP/WebSocket
/// protocol violations, and user-error preconditions. `WouldBlock` and
/// `Interrupted` are deliberately absent — they are retry signals fully
/// recovered inside the session engine and never surfaced to a `Handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The local address is already bound by another socket.
    AddressInUse,
    /// The requested local address cannot be assigned.
    AddressNotAvailable,
    /// The operating system denied the operation.
    PermissionDenied,
    /// The remote peer actively refused the connection.
    ConnectionRefused,
    /// The remote peer reset an established connection.
    ConnectionReset,
    /// The local stack aborted an established connection.
    ConnectionAborted,
    /// The remote host is unreachable at the network layer.
    HostUnreachable,
    /// The operation did not complete within its deadline.
    TimedOut,
    /// The peer closed the connection in an orderly fashion.
    ///
    /// Reported only via `on_disconnected`, never via `on_error`.
    PeerClosed,
    /// The TLS handshake did not complete successfully.
    TlsHandshakeFailed,
    /// A TLS record could not be decoded.
    TlsBadRecord,
    /// The peer's certificate was rejected.
    TlsCertificate,
    /// An HTTP message did not parse as well-formed HTTP/1.1.
    HttpMalformed,
    /// An HTTP message exceeded a configured size limit.
    HttpTooLarge,
    /// A WebSocket frame was structurally invalid.
    WsBadFrame,
    /// A WebSocket frame carried an unrecognized or disallowed opcode.
    WsBadOpcode,
    /// A WebSocket frame's mask bit/key was invalid for the session's role.
    WsBadMask,
    /// A WebSocket protocol invariant was violated (RFC 6455 closes with 1002).
    WsProtocol,
    /// The operation requires a connected session.
    NotConnected,
    /// The operation requires a completed TLS handshake.
    NotHandshaked,
    /// Any other I/O failure not captured above.
    Other,
}

/// The error type returned by every fallible netcore operation.
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct Error {
    /// The category of failure.
    pub kind: ErrorKind,
    /// A human-readable description, not meant to be pattern-matched on.
    pub message: String,
}

impl Error {
    /// Construct an error from a kind and a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::AddrInUse => ErrorKind::AddressInUse,
            std::io::ErrorKind::AddrNotAvailable => ErrorKind::AddressNotAvailable,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset => ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted => ErrorKind::ConnectionAborted,
            std::io::ErrorKind::TimedOut => ErrorKind::TimedOut,
            std::io::ErrorKind::UnexpectedEof => ErrorKind::PeerClosed,
            _ => ErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}

/// Whether an I/O error is a transient retry signal that must never be
/// surfaced to a [`Handler`](crate::handler::Handler).
#[must_use]
pub fn is_retryable(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_kinds_map_to_taxonomy() {
        let e: Error = std::io::Error::from(std::io::ErrorKind::AddrInUse).into();
        assert_eq!(e.kind, ErrorKind::AddressInUse);

        let e: Error = std::io::Error::from(std::io::ErrorKind::ConnectionReset).into();
        assert_eq!(e.kind, ErrorKind::ConnectionReset);
    }

    #[test]
    fn would_block_and_interrupted_are_retryable() {
        assert!(is_retryable(&std::io::Error::from(
            std::io::ErrorKind::WouldBlock
        )));
        assert!(is_retryable(&std::io::Error::from(
            std::io::ErrorKind::Interrupted
        )));
        assert!(!is_retryable(&std::io::Error::from(
            std::io::ErrorKind::ConnectionReset
        )));
    }
}
