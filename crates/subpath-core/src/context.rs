//! The per-page configuration object every component reads.
//!
//! Built once from [`SiteConfig`] and the [`PageEnvironment`], then shared as
//! `Arc<SiteContext>`. It owns the resolved prefix, the URL rewriter, the route
//! mapper, and the one-shot interceptor slot.

use std::sync::{Arc, OnceLock};
use url::Url;

use crate::config::SiteConfig;
use crate::intercept::RewritingTransport;
use crate::prefix::{DeploymentPrefix, PageEnvironment, PrefixResolver, PrefixSource};
use crate::route::{KnownRoutes, RouteMapper};
use crate::transport::Transport;
use crate::url_model::markup::MarkupRewriter;
use crate::url_model::{ResourceFamilies, UrlRewriter};
use crate::worker::{CacheStorage, OfflineWorker, Scope};

/// A transport decorated with prefix rewriting.
pub type InterceptedTransport = RewritingTransport<Arc<dyn Transport>>;

/// What the page hands the platform to register the offline worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRegistrationRequest {
    /// Prefixed worker script path (`/myapp/sw.js`).
    pub script_url: String,
    /// Prefixed scope (`/myapp/`).
    pub scope: String,
}

pub struct SiteContext {
    config: SiteConfig,
    location: Url,
    document_root: Url,
    resolver: PrefixResolver,
    rewriter: UrlRewriter,
    routes: RouteMapper,
    families: ResourceFamilies,
    interceptor: OnceLock<Arc<InterceptedTransport>>,
}

impl SiteContext {
    /// Resolves the prefix for `env` (a configured `base` wins over the page's
    /// own declarations) and derives everything else from it.
    pub fn from_environment(config: SiteConfig, env: PageEnvironment) -> Self {
        let env = env.with_prefix_hint(config.base.clone());
        let resolver = PrefixResolver::new();
        let prefix = resolver.resolve(&env).clone();

        let rewriter = UrlRewriter::new(prefix.clone());
        let routes = RouteMapper::new(
            prefix,
            KnownRoutes::default().with_extensions(&config.extra_routes),
        );
        let families = ResourceFamilies::new(config.worker_script.clone());

        let root_path = rewriter.to_navigation_url("/");
        let document_root = match env.location.join(&root_path) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(location = %env.location, error = %e, "location is not a base URL");
                env.location.clone()
            }
        };

        Self {
            config,
            location: env.location,
            document_root,
            resolver,
            rewriter,
            routes,
            families,
            interceptor: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The document URL the context was built for.
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Origin plus prefix plus `/`: where the app's entry document lives.
    pub fn document_root(&self) -> &Url {
        &self.document_root
    }

    pub fn prefix(&self) -> &DeploymentPrefix {
        self.rewriter.prefix()
    }

    pub fn prefix_source(&self) -> PrefixSource {
        self.resolver.source().unwrap_or(PrefixSource::Default)
    }

    pub fn rewriter(&self) -> &UrlRewriter {
        &self.rewriter
    }

    pub fn routes(&self) -> &RouteMapper {
        &self.routes
    }

    pub fn families(&self) -> &ResourceFamilies {
        &self.families
    }

    pub fn markup(&self) -> MarkupRewriter<'_> {
        MarkupRewriter::new(&self.rewriter, &self.routes, &self.families, &self.location)
    }

    pub fn worker_registration(&self) -> WorkerRegistrationRequest {
        WorkerRegistrationRequest {
            script_url: self.rewriter.to_navigation_url(self.families.worker_script()),
            scope: self.rewriter.to_navigation_url("/"),
        }
    }

    pub fn worker_scope(&self) -> Scope {
        Scope::new(self.document_root.clone())
    }

    /// A worker for this site's scope, configured from `[worker]`.
    pub fn offline_worker(
        &self,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn CacheStorage>,
    ) -> OfflineWorker {
        OfflineWorker::new(
            self.worker_scope(),
            self.routes.routes().clone(),
            self.config.worker.clone(),
            transport,
            storage,
        )
    }

    /// Wraps `inner` with prefix rewriting. Only the first call installs; later
    /// calls return the already installed interceptor and drop `inner`.
    pub fn install_interceptor(&self, inner: Arc<dyn Transport>) -> Arc<InterceptedTransport> {
        let mut fresh = false;
        let installed = self.interceptor.get_or_init(|| {
            fresh = true;
            Arc::new(RewritingTransport::new(
                inner,
                self.rewriter.clone(),
                self.families.clone(),
                self.document_root.clone(),
            ))
        });
        if fresh {
            tracing::debug!(prefix = %self.prefix(), "request interceptor installed");
        } else {
            tracing::debug!("request interceptor already installed");
        }
        Arc::clone(installed)
    }

    pub fn interceptor(&self) -> Option<Arc<InterceptedTransport>> {
        self.interceptor.get().cloned()
    }

    pub fn is_interceptor_installed(&self) -> bool {
        self.interceptor.get().is_some()
    }
}
