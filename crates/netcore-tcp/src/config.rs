//! TCP-specific socket option surface (spec.md §6).

/// Tuning options applied to a TCP socket before it is handed to
/// [`netcore_core::Session::connect`].
///
/// All fields are optional in spirit (each has a documented default) and
/// are set via the chainable [`TcpConfigBuilder`] prior to `start()`/
/// `connect()`, per spec.md §6's "no persisted state, only constructor
/// parameters and mutable option fields" convention.
#[derive(Debug, Clone, Copy)]
pub struct TcpConfig {
    /// Enable `SO_KEEPALIVE`. Default `false`.
    pub keepalive: bool,
    /// Disable Nagle's algorithm (`TCP_NODELAY`). Default `false`.
    pub no_delay: bool,
    /// Enable `SO_REUSEADDR`. Default `false`.
    pub reuse_address: bool,
    /// Enable `SO_REUSEPORT` (where the platform supports it). Default `false`.
    pub reuse_port: bool,
    /// For IPv6 listeners, accept IPv4-mapped connections too. Default `false`.
    pub dual_stack: bool,
    /// Receive buffer size passed to `SO_RCVBUF` and used to size the
    /// session's receive buffer. Default 8 KiB.
    pub receive_buffer_size: usize,
    /// Send buffer size passed to `SO_SNDBUF`. Default 8 KiB.
    pub send_buffer_size: usize,
    /// Backlog passed to `listen(2)`. Default 1024.
    pub acceptor_backlog: u32,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            keepalive: false,
            no_delay: false,
            reuse_address: false,
            reuse_port: false,
            dual_stack: false,
            receive_buffer_size: 8 * 1024,
            send_buffer_size: 8 * 1024,
            acceptor_backlog: 1024,
        }
    }
}

/// Chainable builder for [`TcpConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConfigBuilder {
    config: TcpConfig,
}

impl TcpConfigBuilder {
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`TcpConfig::keepalive`].
    #[must_use]
    pub fn keepalive(mut self, enabled: bool) -> Self {
        self.config.keepalive = enabled;
        self
    }

    /// See [`TcpConfig::no_delay`].
    #[must_use]
    pub fn no_delay(mut self, enabled: bool) -> Self {
        self.config.no_delay = enabled;
        self
    }

    /// See [`TcpConfig::reuse_address`].
    #[must_use]
    pub fn reuse_address(mut self, enabled: bool) -> Self {
        self.config.reuse_address = enabled;
        self
    }

    /// See [`TcpConfig::reuse_port`].
    #[must_use]
    pub fn reuse_port(mut self, enabled: bool) -> Self {
        self.config.reuse_port = enabled;
        self
    }

    /// See [`TcpConfig::dual_stack`].
    #[must_use]
    pub fn dual_stack(mut self, enabled: bool) -> Self {
        self.config.dual_stack = enabled;
        self
    }

    /// See [`TcpConfig::receive_buffer_size`].
    #[must_use]
    pub fn receive_buffer_size(mut self, bytes: usize) -> Self {
        self.config.receive_buffer_size = bytes;
        self
    }

    /// See [`TcpConfig::send_buffer_size`].
    #[must_use]
    pub fn send_buffer_size(mut self, bytes: usize) -> Self {
        self.config.send_buffer_size = bytes;
        self
    }

    /// See [`TcpConfig::acceptor_backlog`].
    #[must_use]
    pub fn acceptor_backlog(mut self, backlog: u32) -> Self {
        self.config.acceptor_backlog = backlog;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> TcpConfig {
        self.config
    }
}
