//! `subpath install` and `subpath activate` – worker lifecycle against the on-disk cache.

use anyhow::Result;
use subpath_core::SiteContext;

use super::persistent_worker;

pub async fn run_install(ctx: &SiteContext) -> Result<()> {
    let worker = persistent_worker(ctx).await?;
    let report = worker.install().await;
    println!("installed {}", worker.version());
    for url in &report.precached {
        println!("  precached {url}");
    }
    for url in &report.failed {
        println!("  failed    {url}");
    }
    Ok(())
}

pub async fn run_activate(ctx: &SiteContext) -> Result<()> {
    let worker = persistent_worker(ctx).await?;
    let report = worker.activate().await;
    println!("activated {}", worker.version());
    if report.deleted.is_empty() {
        println!("  no stale buckets");
    }
    for name in &report.deleted {
        println!("  deleted {name}");
    }
    for name in &report.kept {
        println!("  kept    {name}");
    }
    Ok(())
}
