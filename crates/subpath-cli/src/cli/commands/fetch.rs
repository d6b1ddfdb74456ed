//! `subpath fetch` – one request through the interceptor and the offline worker.

use anyhow::{Context, Result};
use std::sync::Arc;
use subpath_core::intercept::{RequestInit, RequestTarget};
use subpath_core::transport::{CurlTransport, Request, Transport};
use subpath_core::worker::{CacheStorage, FetchOutcome, SqliteCacheStorage};
use subpath_core::SiteContext;

/// Builds the request the page would issue for `raw`. Unprefixed resource
/// paths (`/data/x.json`) come out prefixed, as the interceptor does in the page.
pub(crate) fn page_request(
    ctx: &SiteContext,
    raw: &str,
    navigate: bool,
    accept: Option<&str>,
) -> Result<Request> {
    let url = ctx
        .location()
        .join(raw)
        .with_context(|| format!("invalid URL {raw}"))?;
    let mut req = if navigate {
        Request::navigate(url)
    } else {
        Request::get(url)
    };
    if let Some(accept) = accept {
        req = req.with_header("Accept", accept);
    }
    let network: Arc<dyn Transport> = Arc::new(CurlTransport::new(&ctx.config().transport));
    let interceptor = ctx.install_interceptor(network);
    Ok(interceptor.prepare(RequestTarget::Request(req), RequestInit::default())?)
}

pub async fn run_fetch(ctx: &SiteContext, raw: &str, navigate: bool, accept: Option<&str>) -> Result<()> {
    let req = page_request(ctx, raw, navigate, accept)?;
    println!("request:        {}", req.url);

    // The worker sits behind the interceptor and falls back to the same network.
    let network: Arc<dyn Transport> = match ctx.interceptor() {
        Some(interceptor) => Arc::clone(interceptor.inner()),
        None => Arc::new(CurlTransport::new(&ctx.config().transport)),
    };
    let storage: Arc<dyn CacheStorage> = Arc::new(SqliteCacheStorage::open_default().await?);
    let worker = ctx.offline_worker(Arc::clone(&network), storage);

    let (label, response) = match worker.handle_fetch(req.clone()).await {
        FetchOutcome::Respond {
            classification,
            response,
        } => (classification.as_str(), response),
        FetchOutcome::Ignored => ("ignored", network.fetch(req).await?),
    };
    // Let a stale-while-revalidate refresh finish before the process exits.
    worker.settle().await;

    println!("classification: {label}");
    if response.is_error() {
        println!("status:         network error");
        return Ok(());
    }
    println!("status:         {}", response.status);
    if let Some(url) = &response.url {
        println!("final url:      {url}");
    }
    if let Some(ct) = response.headers.get("content-type") {
        println!("content-type:   {ct}");
    }
    println!("bytes:          {}", response.body.len());
    Ok(())
}
