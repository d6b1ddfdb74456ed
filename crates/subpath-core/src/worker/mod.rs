//! Offline cache worker.
//!
//! One [`OfflineWorker`] per worker version. It classifies every in-scope GET,
//! serves it through the matching strategy, and owns the install/activate
//! lifecycle that precaches the shell and sweeps buckets left by older versions.

pub mod bucket;
pub mod classify;
mod lifecycle;
pub mod registration;
mod scope;
pub mod storage;
pub mod strategy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::WorkerConfig;
use crate::route::KnownRoutes;
use crate::transport::{CacheDirective, Method, Request, Response, Transport};

pub use bucket::{bucket_name, is_stale, BucketName, CacheCategory};
pub use classify::{classify, RouteClassification};
pub use lifecycle::{ActivationReport, InstallReport, WorkerMessage, WorkerState};
pub use registration::WorkerRegistration;
pub use scope::Scope;
pub use storage::{CacheStorage, MatchOptions, MemoryCacheStorage, SqliteCacheStorage};
pub use strategy::{handling_for, Handling, Strategy, StrategyEnv};

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not the worker's business (non-GET or out of scope); use the network as usual.
    Ignored,
    Respond {
        classification: RouteClassification,
        response: Response,
    },
}

impl FetchOutcome {
    pub fn response(self) -> Option<Response> {
        match self {
            FetchOutcome::Ignored => None,
            FetchOutcome::Respond { response, .. } => Some(response),
        }
    }
}

pub struct OfflineWorker {
    scope: Scope,
    routes: KnownRoutes,
    config: WorkerConfig,
    env: StrategyEnv,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
}

impl OfflineWorker {
    pub fn new(
        scope: Scope,
        routes: KnownRoutes,
        config: WorkerConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn CacheStorage>,
    ) -> Self {
        let shell_urls = scope.shell_urls(&config.shell_document);
        let env = StrategyEnv::new(transport, storage, config.version.clone(), shell_urls);
        Self {
            scope,
            routes,
            config,
            env,
            state: Mutex::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.env.storage
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_state(&self, next: WorkerState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let prev = *state;
        if prev != next {
            tracing::debug!(version = %self.config.version, from = %prev, to = %next, "worker state");
            *state = next;
        }
    }

    pub fn bucket(&self, category: CacheCategory) -> String {
        bucket_name(&self.config.version, category)
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Classification of `req`, or `None` when the worker would not handle it.
    pub fn classify(&self, req: &Request) -> Option<RouteClassification> {
        if req.method != Method::Get || !self.scope.contains(&req.url) {
            return None;
        }
        Some(classify(req, &self.scope, &self.routes))
    }

    pub async fn handle_fetch(&self, req: Request) -> FetchOutcome {
        let Some(classification) = self.classify(&req) else {
            return FetchOutcome::Ignored;
        };
        let handling = handling_for(classification);
        tracing::debug!(url = %req.url, %classification, strategy = ?handling.strategy, "handling fetch");
        let response = self.env.run(handling, req).await;
        FetchOutcome::Respond {
            classification,
            response,
        }
    }

    /// Best-effort precache of both shell addresses, bypassing HTTP caches.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing);
        let shell_bucket = self.bucket(CacheCategory::Shell);
        if let Err(e) = self.env.storage.open(&shell_bucket).await {
            tracing::warn!(bucket = %shell_bucket, error = %e, "could not open shell bucket");
        }

        let mut report = InstallReport::default();
        for url in &self.env.shell_urls {
            let req = Request::get(url.clone()).with_cache(CacheDirective::Reload);
            match self.env.transport.fetch(req).await {
                Ok(res) if res.is_ok() => {
                    self.env.put_if_ok(CacheCategory::Shell, url, &res).await;
                    report.precached.push(url.clone());
                }
                Ok(res) => {
                    tracing::debug!(url = %url, status = res.status, "shell precache skipped");
                    report.failed.push(url.clone());
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "shell precache failed");
                    report.failed.push(url.clone());
                }
            }
        }

        self.set_state(WorkerState::Installed);
        if self.config.skip_waiting_on_install {
            self.skip_waiting.store(true, Ordering::SeqCst);
        }
        tracing::info!(
            version = %self.config.version,
            precached = report.precached.len(),
            failed = report.failed.len(),
            "worker installed"
        );
        report
    }

    /// Deletes every bucket of this family written by another version. Taking over
    /// open pages is the registration's job: see [`WorkerRegistration::register`].
    pub async fn activate(&self) -> ActivationReport {
        self.set_state(WorkerState::Activating);
        let mut report = ActivationReport::default();

        let names = match self.env.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list cache buckets; skipping sweep");
                Vec::new()
            }
        };
        for name in names {
            if !is_stale(&name, &self.config.version, &self.config.family) {
                report.kept.push(name);
                continue;
            }
            match self.env.storage.delete(&name).await {
                Ok(_) => report.deleted.push(name),
                Err(e) => {
                    tracing::warn!(bucket = %name, error = %e, "could not delete stale bucket");
                    report.kept.push(name);
                }
            }
        }

        self.set_state(WorkerState::Activated);
        tracing::info!(
            version = %self.config.version,
            deleted = report.deleted.len(),
            kept = report.kept.len(),
            "worker activated"
        );
        report
    }

    pub fn on_message(&self, message: WorkerMessage) {
        match message {
            WorkerMessage::SkipWaiting => {
                tracing::debug!(version = %self.config.version, "skip waiting requested");
                self.skip_waiting.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Waits for background revalidations started by earlier fetches.
    pub async fn settle(&self) {
        self.env.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use url::Url;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn fetch(&self, request: Request) -> Result<Response, TransportError> {
            Err(TransportError::network(request.url.as_str(), "offline"))
        }
    }

    fn worker(version: &str, storage: Arc<dyn CacheStorage>) -> OfflineWorker {
        let config = WorkerConfig {
            version: version.to_string(),
            ..WorkerConfig::default()
        };
        OfflineWorker::new(
            Scope::new(Url::parse("https://h/myapp/").unwrap()),
            KnownRoutes::default(),
            config,
            Arc::new(Offline),
            storage,
        )
    }

    #[tokio::test]
    async fn ignores_non_get_and_out_of_scope() {
        let w = worker("subpath-sw-v1", Arc::new(MemoryCacheStorage::new()));
        let post = Request::get(Url::parse("https://h/myapp/data/a.json").unwrap()).with_method(Method::Post);
        assert_eq!(w.handle_fetch(post).await, FetchOutcome::Ignored);
        let foreign = Request::get(Url::parse("https://cdn.io/myapp/x.js").unwrap());
        assert_eq!(w.handle_fetch(foreign).await, FetchOutcome::Ignored);
        let outside = Request::get(Url::parse("https://h/other/x.js").unwrap());
        assert!(w.classify(&outside).is_none());
    }

    #[tokio::test]
    async fn offline_install_still_creates_shell_bucket() {
        let store = Arc::new(MemoryCacheStorage::new());
        let w = worker("subpath-sw-v1", store.clone());
        let report = w.install().await;
        assert!(report.precached.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(w.state(), WorkerState::Installed);
        assert!(w.skip_waiting_requested());
        assert!(store.has("subpath-sw-v1:shell").await.unwrap());
    }

    #[tokio::test]
    async fn activation_sweeps_only_old_family_buckets() {
        let store = Arc::new(MemoryCacheStorage::new());
        for name in ["subpath-sw-v1:shell", "subpath-sw-v1:code", "subpath-sw-v2:data", "other:cache"] {
            store.open(name).await.unwrap();
        }
        let w = worker("subpath-sw-v2", store.clone());
        let report = w.activate().await;
        assert_eq!(report.deleted, vec!["subpath-sw-v1:shell", "subpath-sw-v1:code"]);
        assert_eq!(report.kept, vec!["subpath-sw-v2:data", "other:cache"]);
        assert_eq!(w.state(), WorkerState::Activated);
        assert_eq!(store.keys().await.unwrap(), vec!["subpath-sw-v2:data", "other:cache"]);
    }

    #[tokio::test]
    async fn skip_waiting_message() {
        let config = WorkerConfig {
            skip_waiting_on_install: false,
            ..WorkerConfig::default()
        };
        let w = OfflineWorker::new(
            Scope::new(Url::parse("https://h/").unwrap()),
            KnownRoutes::default(),
            config,
            Arc::new(Offline),
            Arc::new(MemoryCacheStorage::new()),
        );
        w.install().await;
        assert!(!w.skip_waiting_requested());
        w.on_message(WorkerMessage::SkipWaiting);
        assert!(w.skip_waiting_requested());
    }
}
