//! UDP socket tuning options (spec.md §6, the datagram-relevant subset).

/// Tuning options applied to a UDP socket before [`crate::DatagramEngine`]
/// takes ownership of it.
#[derive(Debug, Clone, Copy)]
pub struct UdpConfig {
    /// Enable `SO_REUSEADDR`. Default `false`; spec.md §6 calls this out
    /// as required-on when several sockets share one multicast group's
    /// local port.
    pub reuse_address: bool,
    /// Enable `SO_REUSEPORT` where the platform supports it. Default `false`.
    pub reuse_port: bool,
    /// Receive buffer size passed to `SO_RCVBUF` and used to size the
    /// per-datagram receive buffer. Default 8 KiB.
    pub receive_buffer_size: usize,
    /// Send buffer size passed to `SO_SNDBUF`. Default 8 KiB.
    pub send_buffer_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            reuse_address: false,
            reuse_port: false,
            receive_buffer_size: 8 * 1024,
            send_buffer_size: 8 * 1024,
        }
    }
}

/// Chainable builder for [`UdpConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConfigBuilder {
    config: UdpConfig,
}

impl UdpConfigBuilder {
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`UdpConfig::reuse_address`].
    #[must_use]
    pub fn reuse_address(mut self, enabled: bool) -> Self {
        self.config.reuse_address = enabled;
        self
    }

    /// See [`UdpConfig::reuse_port`].
    #[must_use]
    pub fn reuse_port(mut self, enabled: bool) -> Self {
        self.config.reuse_port = enabled;
        self
    }

    /// See [`UdpConfig::receive_buffer_size`].
    #[must_use]
    pub fn receive_buffer_size(mut self, bytes: usize) -> Self {
        self.config.receive_buffer_size = bytes;
        self
    }

    /// See [`UdpConfig::send_buffer_size`].
    #[must_use]
    pub fn send_buffer_size(mut self, bytes: usize) -> Self {
        self.config.send_buffer_size = bytes;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> UdpConfig {
        self.config
    }
}
