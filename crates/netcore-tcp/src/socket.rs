//! Pre-bind/pre-connect socket option application via `socket2`.
//!
//! `tokio::net::{TcpListener, TcpStream}` expose none of spec.md §6's
//! socket-option surface directly, so a raw `socket2::Socket` is built,
//! configured, bound/connected, and then converted into the tokio type.

use std::net::SocketAddr;

use netcore_core::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::TcpConfig;

pub(crate) fn configured_socket(addr: SocketAddr, config: &TcpConfig) -> Result<Socket> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(Error::from)?;
    socket.set_nonblocking(true).map_err(Error::from)?;

    if config.reuse_address {
        socket.set_reuse_address(true).map_err(Error::from)?;
    }
    #[cfg(unix)]
    if config.reuse_port {
        socket.set_reuse_port(true).map_err(Error::from)?;
    }
    if addr.is_ipv6() {
        socket.set_only_v6(!config.dual_stack).map_err(Error::from)?;
    }
    if config.keepalive {
        socket.set_keepalive(true).map_err(Error::from)?;
    }
    socket
        .set_recv_buffer_size(config.receive_buffer_size)
        .map_err(Error::from)?;
    socket
        .set_send_buffer_size(config.send_buffer_size)
        .map_err(Error::from)?;

    Ok(socket)
}

pub(crate) fn apply_no_delay(stream: &tokio::net::TcpStream, config: &TcpConfig) -> Result<()> {
    stream.set_nodelay(config.no_delay).map_err(Error::from)
}
