//! `HttpServer`: drives [`netcore_core::ServerCore`] generically over any
//! [`netcore_core::Listener`] (TCP, UNIX, or TLS), wrapping each accepted
//! session in an [`HttpSession`].

use std::path::Path;
use std::sync::Arc;

use netcore_core::{Listener, Registry, Result, ServerCore};

use crate::handler::HttpHandler;
use crate::session::{server_factory, BoxedFactory, HttpSession};
use crate::static_cache::StaticContentCache;

/// An HTTP server over any byte-stream [`Listener`] (plain TCP via
/// `netcore-tcp`, UNIX via `netcore-unix`, or TLS-wrapped via
/// `netcore-tls`).
pub struct HttpServer<L, H>
where
    L: Listener,
    H: HttpHandler,
{
    core: ServerCore<L, HttpSession<H>, BoxedFactory<HttpSession<H>>>,
    static_cache: Arc<StaticContentCache>,
}

impl<L, H> HttpServer<L, H>
where
    L: Listener,
    H: HttpHandler,
{
    /// Wrap an already-bound listener with `factory` producing one
    /// [`HttpHandler`] per connection. A [`StaticContentCache`] is always
    /// created; call [`HttpServer::add_static_content`] to populate it.
    pub fn with_listener<F>(listener: L, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
    {
        let static_cache = Arc::new(StaticContentCache::default());
        let inner_factory = server_factory(factory, Some(static_cache.clone()));
        Self {
            core: ServerCore::new(listener, inner_factory),
            static_cache,
        }
    }

    /// Register a directory for static file serving under `url_prefix`
    /// (spec.md §4.6/§4.8).
    pub fn add_static_content(&self, dir: impl AsRef<Path>, url_prefix: &str) -> Result<()> {
        self.static_cache.add_static_content(dir, url_prefix)
    }

    /// Arm the accept loop and start the static content refresh timer.
    pub fn start(&self) {
        self.core.start();
        self.static_cache.clone().spawn_refresh_task();
    }

    /// See [`ServerCore::stop`].
    pub async fn stop(&self) {
        self.core.stop().await;
    }

    /// See [`ServerCore::restart`].
    pub async fn restart(&self) {
        self.core.restart().await;
    }

    /// The live session registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry<HttpSession<H>>> {
        self.core.registry()
    }

    /// Number of currently connected sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.core.session_count()
    }
}
