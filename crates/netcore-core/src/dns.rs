//! Resolve a host string to a set of addresses, synchronously at
//! construction time.

use std::net::SocketAddr;

use crate::error::{Error, ErrorKind, Result};

/// Thin wrapper over the runtime's resolver.
///
/// Per spec.md §1's non-goals, netcore performs no DNS resolution beyond a
/// single call made once at construction; there is no re-resolution,
/// caching policy, or retry here. `tokio::net::lookup_host` is the async
/// equivalent of the source's one-shot synchronous resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct DnsFacade;

impl DnsFacade {
    /// Resolve `host_and_port` (e.g. `"example.com:443"`) to its address
    /// set. Returns `HostUnreachable` if resolution yields no addresses.
    pub async fn resolve(host_and_port: &str) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(host_and_port)
            .await
            .map_err(Error::from)?
            .collect();
        if addrs.is_empty() {
            return Err(Error::new(
                ErrorKind::HostUnreachable,
                format!("no addresses found for {host_and_port}"),
            ));
        }
        Ok(addrs)
    }

    /// As [`DnsFacade::resolve`], returning only the first address.
    pub async fn resolve_one(host_and_port: &str) -> Result<SocketAddr> {
        Self::resolve(host_and_port)
            .await
            .map(|addrs| addrs[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_a_literal_address() {
        let addrs = DnsFacade::resolve("127.0.0.1:8080").await.unwrap();
        assert_eq!(addrs[0].to_string(), "127.0.0.1:8080");
    }
}
