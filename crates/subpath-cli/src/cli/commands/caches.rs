//! `subpath caches` – list persisted buckets.

use anyhow::Result;
use subpath_core::worker::{is_stale, CacheStorage, SqliteCacheStorage};
use subpath_core::SiteContext;

pub async fn run_caches(ctx: &SiteContext) -> Result<()> {
    let storage = SqliteCacheStorage::open_default().await?;
    let names = storage.keys().await?;
    if names.is_empty() {
        println!("No cache buckets.");
        return Ok(());
    }
    let worker = &ctx.config().worker;
    println!("{:<36} {:<8} {}", "BUCKET", "ENTRIES", "STATE");
    for name in names {
        let entries = storage.entries(&name).await?.len();
        let state = if name.starts_with(&format!("{}:", worker.version)) {
            "current"
        } else if is_stale(&name, &worker.version, &worker.family) {
            "stale"
        } else {
            "foreign"
        };
        println!("{:<36} {:<8} {}", name, entries, state);
    }
    Ok(())
}
