//! CLI command handlers, one file per command.

mod caches;
mod fetch;
mod lifecycle;
mod resolve;
mod rewrite;
mod route;

pub use caches::run_caches;
pub use fetch::run_fetch;
pub(crate) use fetch::page_request;
pub use lifecycle::{run_activate, run_install};
pub use resolve::run_resolve;
pub use rewrite::run_rewrite;
pub use route::run_route;

use anyhow::Result;
use std::sync::Arc;
use subpath_core::transport::{CurlTransport, Transport};
use subpath_core::worker::{CacheStorage, OfflineWorker, SqliteCacheStorage};
use subpath_core::SiteContext;

/// A worker for `ctx` backed by curl and the on-disk cache.
pub(crate) async fn persistent_worker(ctx: &SiteContext) -> Result<OfflineWorker> {
    let transport: Arc<dyn Transport> = Arc::new(CurlTransport::new(&ctx.config().transport));
    let storage: Arc<dyn CacheStorage> = Arc::new(SqliteCacheStorage::open_default().await?);
    Ok(ctx.offline_worker(transport, storage))
}

/// Empty prefix prints as `(root)`.
pub(crate) fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() {
        "(root)"
    } else {
        prefix
    }
}
