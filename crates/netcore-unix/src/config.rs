//! UNIX-socket tuning options (spec.md §6, the subset meaningful for `AF_UNIX`).

/// Tuning options for a UNIX domain socket session.
///
/// Several of spec.md §6's socket options (`keepalive`, `no_delay`,
/// `reuse_address`/`reuse_port`, `dual_stack`) are TCP/IP-specific and do
/// not apply to `AF_UNIX`; only the buffer sizes and backlog carry over.
#[derive(Debug, Clone, Copy)]
pub struct UnixConfig {
    /// Receive buffer size, used to size the session's receive buffer.
    /// Default 8 KiB.
    pub receive_buffer_size: usize,
    /// Backlog passed to `listen(2)`. Default 1024.
    pub acceptor_backlog: u32,
}

impl Default for UnixConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: 8 * 1024,
            acceptor_backlog: 1024,
        }
    }
}

/// Chainable builder for [`UnixConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixConfigBuilder {
    config: UnixConfig,
}

impl UnixConfigBuilder {
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`UnixConfig::receive_buffer_size`].
    #[must_use]
    pub fn receive_buffer_size(mut self, bytes: usize) -> Self {
        self.config.receive_buffer_size = bytes;
        self
    }

    /// See [`UnixConfig::acceptor_backlog`].
    #[must_use]
    pub fn acceptor_backlog(mut self, backlog: u32) -> Self {
        self.config.acceptor_backlog = backlog;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> UnixConfig {
        self.config
    }
}
