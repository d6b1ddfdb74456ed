//! Handling policies and the table mapping each classification to one.
//!
//! Every strategy resolves to a [`Response`]: network and storage failures are
//! absorbed by the fallback chain and end, at worst, in [`Response::error`].

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use super::bucket::{bucket_name, CacheCategory};
use super::classify::RouteClassification;
use super::storage::{CacheStorage, MatchOptions};
use crate::transport::{Request, Response, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve the cached shell document.
    ShellFallback,
    /// Network first; 404 and offline fall back to cache, then the shell.
    NavigationNetworkFirst,
    /// Network first; offline falls back to the exact cached payload.
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
    /// Network, then any cached copy.
    NetworkThenCache,
}

/// What to do with one classification: the policy and the bucket it writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handling {
    pub strategy: Strategy,
    pub bucket: Option<CacheCategory>,
}

const fn handling(strategy: Strategy, bucket: Option<CacheCategory>) -> Handling {
    Handling { strategy, bucket }
}

/// Dispatch table, one row per classification.
pub const DISPATCH: [(RouteClassification, Handling); 6] = [
    (
        RouteClassification::SpaFetchFallback,
        handling(Strategy::ShellFallback, Some(CacheCategory::Shell)),
    ),
    (
        RouteClassification::Navigation,
        handling(Strategy::NavigationNetworkFirst, Some(CacheCategory::Html)),
    ),
    (
        RouteClassification::Data,
        handling(Strategy::NetworkFirst, Some(CacheCategory::Data)),
    ),
    (
        RouteClassification::Asset,
        handling(Strategy::CacheFirst, Some(CacheCategory::Assets)),
    ),
    (
        RouteClassification::Code,
        handling(Strategy::StaleWhileRevalidate, Some(CacheCategory::Code)),
    ),
    (
        RouteClassification::Default,
        handling(Strategy::NetworkThenCache, None),
    ),
];

pub fn handling_for(class: RouteClassification) -> Handling {
    DISPATCH
        .iter()
        .find(|(c, _)| *c == class)
        .map(|(_, h)| *h)
        .unwrap_or(handling(Strategy::NetworkThenCache, None))
}

/// Everything a strategy touches: network, storage, the running version and the shell.
#[derive(Clone)]
pub struct StrategyEnv {
    pub transport: Arc<dyn Transport>,
    pub storage: Arc<dyn CacheStorage>,
    pub version: String,
    /// Scope root first, then the explicit shell document.
    pub shell_urls: Vec<Url>,
    refreshes: Arc<Mutex<JoinSet<()>>>,
}

impl StrategyEnv {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn CacheStorage>,
        version: impl Into<String>,
        shell_urls: Vec<Url>,
    ) -> Self {
        Self {
            transport,
            storage,
            version: version.into(),
            shell_urls,
            refreshes: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn bucket(&self, category: CacheCategory) -> String {
        bucket_name(&self.version, category)
    }

    /// Runs the strategy `handling` names for `req`.
    pub async fn run(&self, handling: Handling, req: Request) -> Response {
        let bucket = handling.bucket;
        match handling.strategy {
            Strategy::ShellFallback => self.shell_fallback().await,
            Strategy::NavigationNetworkFirst => {
                self.navigation(req, bucket.unwrap_or(CacheCategory::Html)).await
            }
            Strategy::NetworkFirst => self.network_first(req, bucket.unwrap_or(CacheCategory::Data)).await,
            Strategy::CacheFirst => self.cache_first(req, bucket.unwrap_or(CacheCategory::Assets)).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(req, bucket.unwrap_or(CacheCategory::Code))
                    .await
            }
            Strategy::NetworkThenCache => self.network_then_cache(req).await,
        }
    }

    /// Waits for every background refresh started so far.
    pub async fn settle(&self) {
        let mut pending = {
            let mut guard = self.refreshes.lock().await;
            std::mem::take(&mut *guard)
        };
        while let Some(res) = pending.join_next().await {
            if let Err(e) = res {
                tracing::warn!(error = %e, "background refresh task failed");
            }
        }
    }

    /// Stores `response` if it is a 2xx. Storage failures are logged and ignored.
    pub async fn put_if_ok(&self, category: CacheCategory, url: &Url, response: &Response) {
        put_if_ok(self.storage.as_ref(), &self.bucket(category), url, response).await;
    }

    async fn lookup(&self, category: CacheCategory, url: &Url, opts: MatchOptions) -> Option<Response> {
        let bucket = self.bucket(category);
        match self.storage.match_in(&bucket, url, opts).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(bucket = %bucket, url = %url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    async fn lookup_any(&self, url: &Url, opts: MatchOptions) -> Option<Response> {
        match self.storage.match_any(url, opts).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// The shell from the shell bucket, trying each shell address ignoring search.
    pub async fn cached_shell(&self) -> Option<Response> {
        for url in &self.shell_urls {
            if let Some(hit) = self
                .lookup(CacheCategory::Shell, url, MatchOptions::ignore_search())
                .await
            {
                return Some(hit);
            }
        }
        None
    }

    async fn shell_fallback(&self) -> Response {
        if let Some(shell) = self.cached_shell().await {
            return shell;
        }
        let Some(root) = self.shell_urls.first() else {
            return Response::error();
        };
        tracing::debug!(url = %root, "shell not cached; fetching scope root");
        match self.transport.fetch(Request::get(root.clone())).await {
            Ok(res) if res.is_ok() => {
                self.put_if_ok(CacheCategory::Shell, root, &res).await;
                res
            }
            Ok(res) => {
                tracing::debug!(status = res.status, "scope root fetch not ok; no shell to serve");
                Response::error()
            }
            Err(e) => {
                tracing::debug!(error = %e, "scope root unreachable; no shell to serve");
                Response::error()
            }
        }
    }

    async fn navigation(&self, req: Request, category: CacheCategory) -> Response {
        let url = req.url.clone();
        match self.transport.fetch(req).await {
            Ok(res) if res.status == 404 => {
                if let Some(hit) = self.lookup_any(&url, MatchOptions::exact()).await {
                    return hit;
                }
                self.cached_shell().await.unwrap_or(res)
            }
            Ok(res) => {
                self.put_if_ok(category, &url, &res).await;
                res
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "navigation offline; serving from cache");
                if let Some(hit) = self.lookup_any(&url, MatchOptions::ignore_search()).await {
                    return hit;
                }
                self.cached_shell().await.unwrap_or_else(Response::error)
            }
        }
    }

    async fn network_first(&self, req: Request, category: CacheCategory) -> Response {
        let url = req.url.clone();
        match self.transport.fetch(req).await {
            Ok(res) => {
                self.put_if_ok(category, &url, &res).await;
                res
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "network failed; trying cached payload");
                self.lookup(category, &url, MatchOptions::exact())
                    .await
                    .unwrap_or_else(Response::error)
            }
        }
    }

    async fn cache_first(&self, req: Request, category: CacheCategory) -> Response {
        if let Some(hit) = self
            .lookup(category, &req.url, MatchOptions::ignore_search())
            .await
        {
            return hit;
        }
        let url = req.url.clone();
        match self.transport.fetch(req).await {
            Ok(res) => {
                self.put_if_ok(category, &url, &res).await;
                res
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "asset not cached and network failed");
                Response::error()
            }
        }
    }

    async fn stale_while_revalidate(&self, req: Request, category: CacheCategory) -> Response {
        let hit = self
            .lookup(category, &req.url, MatchOptions::ignore_search())
            .await;
        let transport = Arc::clone(&self.transport);
        let storage = Arc::clone(&self.storage);
        let bucket = self.bucket(category);

        match hit {
            Some(hit) => {
                let mut set = self.refreshes.lock().await;
                // finished refreshes stay in the set until joined
                while let Some(done) = set.try_join_next() {
                    if let Err(e) = done {
                        tracing::warn!(error = %e, "background refresh task failed");
                    }
                }
                set.spawn(async move {
                    refresh(transport.as_ref(), storage.as_ref(), &bucket, req).await;
                });
                hit
            }
            None => refresh(transport.as_ref(), storage.as_ref(), &bucket, req)
                .await
                .unwrap_or_else(Response::error),
        }
    }

    async fn network_then_cache(&self, req: Request) -> Response {
        let url = req.url.clone();
        match self.transport.fetch(req).await {
            Ok(res) => res,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "network failed; trying any cache");
                self.lookup_any(&url, MatchOptions::ignore_search())
                    .await
                    .unwrap_or_else(Response::error)
            }
        }
    }
}

async fn put_if_ok(storage: &dyn CacheStorage, bucket: &str, url: &Url, response: &Response) {
    if !response.is_ok() {
        return;
    }
    if let Err(e) = storage.put(bucket, url, response).await {
        tracing::warn!(bucket, url = %url, error = %e, "cache write failed; continuing uncached");
    }
}

/// Fetches `req` and updates `bucket`. `None` when the network failed.
async fn refresh(
    transport: &dyn Transport,
    storage: &dyn CacheStorage,
    bucket: &str,
    req: Request,
) -> Option<Response> {
    let url = req.url.clone();
    match transport.fetch(req).await {
        Ok(res) => {
            put_if_ok(storage, bucket, &url, &res).await;
            Some(res)
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "revalidation failed");
            None
        }
    }
}
