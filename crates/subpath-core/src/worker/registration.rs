//! Registration: which worker version controls a scope.
//!
//! A newly registered worker is installed at once. It takes over straight
//! away when nothing is active yet or when it asked to skip waiting; otherwise
//! it waits until a [`WorkerMessage::SkipWaiting`] is posted to it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{FetchOutcome, OfflineWorker, Scope, WorkerMessage, WorkerState};
use crate::error::TransportError;
use crate::transport::{Request, Response, Transport};

pub struct WorkerRegistration {
    scope: Scope,
    active: RwLock<Option<Arc<OfflineWorker>>>,
    waiting: RwLock<Option<Arc<OfflineWorker>>>,
    /// Where requests go when no worker handles them.
    network: Arc<dyn Transport>,
}

impl WorkerRegistration {
    pub fn new(scope: Scope, network: Arc<dyn Transport>) -> Self {
        Self {
            scope,
            active: RwLock::new(None),
            waiting: RwLock::new(None),
            network,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub async fn active(&self) -> Option<Arc<OfflineWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<OfflineWorker>> {
        self.waiting.read().await.clone()
    }

    /// Installs `worker` and either activates it or parks it as the waiting worker.
    pub async fn register(&self, worker: OfflineWorker) -> Arc<OfflineWorker> {
        let worker = Arc::new(worker);
        worker.install().await;

        let has_active = self.active.read().await.is_some();
        if !has_active || worker.skip_waiting_requested() {
            self.promote(Arc::clone(&worker)).await;
        } else {
            let replaced = self.waiting.write().await.replace(Arc::clone(&worker));
            if let Some(old) = replaced {
                old.set_state(WorkerState::Redundant);
            }
            tracing::info!(version = worker.version(), "worker installed; waiting for activation");
        }
        worker
    }

    /// Makes `worker` the active one; from here on it controls every fetch in scope.
    async fn promote(&self, worker: Arc<OfflineWorker>) {
        {
            let mut waiting = self.waiting.write().await;
            if waiting.as_ref().is_some_and(|w| Arc::ptr_eq(w, &worker)) {
                *waiting = None;
            }
        }
        // Pending revalidations of the old worker write into its own buckets;
        // they must land before the sweep or they resurrect them.
        if let Some(old) = self.active().await {
            old.settle().await;
        }
        worker.activate().await;
        let previous = self.active.write().await.replace(worker);
        if let Some(old) = previous {
            old.set_state(WorkerState::Redundant);
        }
    }

    /// Delivers `message` to the waiting worker (and the active one). A waiting
    /// worker told to skip waiting is activated before this returns.
    pub async fn post_message(&self, message: WorkerMessage) {
        if let Some(active) = self.active().await {
            active.on_message(message);
        }
        let Some(waiting) = self.waiting().await else {
            return;
        };
        waiting.on_message(message);
        if waiting.skip_waiting_requested() {
            self.promote(waiting).await;
        }
    }

    /// Routes `req` through the active worker; ignored requests and the
    /// no-worker case go to the network.
    pub async fn fetch(&self, req: Request) -> Result<Response, TransportError> {
        if let Some(worker) = self.active().await {
            if let FetchOutcome::Respond { response, .. } = worker.handle_fetch(req.clone()).await {
                return Ok(response);
            }
        }
        self.network.fetch(req).await
    }
}

#[async_trait]
impl Transport for WorkerRegistration {
    async fn fetch(&self, request: Request) -> Result<Response, TransportError> {
        WorkerRegistration::fetch(self, request).await
    }
}
