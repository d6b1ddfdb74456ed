//! End-to-end offline worker behavior through a registration, with scripted network.

mod common;

use std::sync::Arc;

use common::scripted::ScriptedTransport;
use subpath_core::config::{SiteConfig, WorkerConfig};
use subpath_core::prefix::PageEnvironment;
use subpath_core::transport::{Request, Transport};
use subpath_core::worker::{
    CacheStorage, MemoryCacheStorage, SqliteCacheStorage, WorkerMessage, WorkerRegistration, WorkerState,
};
use subpath_core::SiteContext;
use url::Url;

const ORIGIN: &str = "https://user.github.io";
const SHELL: &str = "<!doctype html><title>shell</title>";
const PAGE: &str = r#"<html><body><script src="/myapp/js/app.js"></script></body></html>"#;

fn url(path: &str) -> Url {
    Url::parse(&format!("{ORIGIN}{path}")).unwrap()
}

fn site(version: &str) -> SiteContext {
    let config = SiteConfig {
        worker: WorkerConfig {
            version: version.to_string(),
            ..WorkerConfig::default()
        },
        ..SiteConfig::default()
    };
    SiteContext::from_environment(config, PageEnvironment::from_html(url("/myapp/"), PAGE))
}

fn network() -> Arc<ScriptedTransport> {
    let net = Arc::new(ScriptedTransport::new());
    net.route(&format!("{ORIGIN}/myapp/"), 200, SHELL);
    net.route(&format!("{ORIGIN}/myapp/index.html"), 200, SHELL);
    net
}

async fn registered(
    ctx: &SiteContext,
    net: &Arc<ScriptedTransport>,
    storage: Arc<dyn CacheStorage>,
) -> WorkerRegistration {
    let network: Arc<dyn Transport> = net.clone();
    let reg = WorkerRegistration::new(ctx.worker_scope(), Arc::clone(&network));
    let worker = reg.register(ctx.offline_worker(network, storage)).await;
    assert_eq!(worker.state(), WorkerState::Activated);
    reg
}

#[tokio::test]
async fn client_route_fetch_gets_the_shell() {
    let ctx = site("subpath-sw-v1");
    let net = network();
    let reg = registered(&ctx, &net, Arc::new(MemoryCacheStorage::new())).await;

    // Not a navigation, no extension, not data/asset/code: a client route.
    let res = reg.fetch(Request::get(url("/myapp/tips/lootbar"))).await.unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.text(), SHELL);

    // Served from the precache even with the network gone.
    net.set_offline(true);
    let res = reg.fetch(Request::get(url("/myapp/heroes/charlie"))).await.unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.text(), SHELL);
}

#[tokio::test]
async fn cached_asset_needs_no_network() {
    let ctx = site("subpath-sw-v1");
    let net = network();
    net.route(&format!("{ORIGIN}/myapp/assets/hero.png"), 200, "png-bytes");
    let reg = registered(&ctx, &net, Arc::new(MemoryCacheStorage::new())).await;

    let first = reg.fetch(Request::get(url("/myapp/assets/hero.png"))).await.unwrap();
    assert_eq!(first.text(), "png-bytes");

    net.set_offline(true);
    let before = net.calls();
    let second = reg.fetch(Request::get(url("/myapp/assets/hero.png"))).await.unwrap();
    assert_eq!(second.status, 200);
    assert_eq!(second.text(), "png-bytes");
    assert_eq!(net.calls(), before);

    // A cache-busting query still hits the stored copy.
    let busted = reg
        .fetch(Request::get(url("/myapp/assets/hero.png?v=3")))
        .await
        .unwrap();
    assert_eq!(busted.text(), "png-bytes");
    assert_eq!(net.calls(), before);
}

#[tokio::test]
async fn script_is_served_stale_then_revalidated() {
    let ctx = site("subpath-sw-v1");
    let net = network();
    let script = format!("{ORIGIN}/myapp/js/app.js");
    net.route(&script, 200, "console.log(1)");
    let reg = registered(&ctx, &net, Arc::new(MemoryCacheStorage::new())).await;
    let worker = reg.active().await.unwrap();

    let res = reg.fetch(Request::get(url("/myapp/js/app.js"))).await.unwrap();
    assert_eq!(res.text(), "console.log(1)");

    net.route(&script, 200, "console.log(2)");
    let stale = reg.fetch(Request::get(url("/myapp/js/app.js"))).await.unwrap();
    assert_eq!(stale.text(), "console.log(1)");

    worker.settle().await;
    let fresh = reg.fetch(Request::get(url("/myapp/js/app.js"))).await.unwrap();
    assert_eq!(fresh.text(), "console.log(2)");
}

#[tokio::test]
async fn data_falls_back_to_last_good_copy() {
    let ctx = site("subpath-sw-v1");
    let net = network();
    net.route(&format!("{ORIGIN}/myapp/data/heroes.json"), 200, r#"{"heroes":[]}"#);
    let reg = registered(&ctx, &net, Arc::new(MemoryCacheStorage::new())).await;

    let online = reg.fetch(Request::get(url("/myapp/data/heroes.json"))).await.unwrap();
    assert_eq!(online.status, 200);

    net.set_offline(true);
    let offline = reg.fetch(Request::get(url("/myapp/data/heroes.json"))).await.unwrap();
    assert_eq!(offline.text(), r#"{"heroes":[]}"#);

    let never_seen = reg.fetch(Request::get(url("/myapp/data/tips.json"))).await.unwrap();
    assert!(never_seen.is_error());
}

#[tokio::test]
async fn interceptor_over_the_worker_prefixes_app_fetches() {
    let ctx = site("subpath-sw-v1");
    let net = network();
    net.route(&format!("{ORIGIN}/myapp/data/heroes.json"), 200, "[1]");
    let reg = registered(&ctx, &net, Arc::new(MemoryCacheStorage::new())).await;

    let fetcher = ctx.install_interceptor(Arc::new(reg));
    let res = fetcher
        .fetch_target("/data/heroes.json", Default::default())
        .await
        .unwrap();
    assert_eq!(res.text(), "[1]");
    assert!(net.log().contains(&format!("{ORIGIN}/myapp/data/heroes.json")));

    let first = fetcher
        .fetch_first_ok(&["/data/missing.json", "/data/heroes.json"])
        .await
        .unwrap();
    assert_eq!(first.used_url, format!("{ORIGIN}/myapp/data/heroes.json"));
    assert_eq!(first.attempted.len(), 2);
}

#[tokio::test]
async fn new_version_sweeps_old_buckets_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache.db");
    let net = network();
    net.route(&format!("{ORIGIN}/myapp/data/heroes.json"), 200, "[]");

    {
        let storage: Arc<dyn CacheStorage> = Arc::new(SqliteCacheStorage::open_at(&db).await.unwrap());
        let reg = registered(&site("subpath-sw-v1"), &net, storage.clone()).await;
        reg.fetch(Request::get(url("/myapp/data/heroes.json"))).await.unwrap();
        let mut keys = storage.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["subpath-sw-v1:data", "subpath-sw-v1:shell"]);
    }

    let storage: Arc<dyn CacheStorage> = Arc::new(SqliteCacheStorage::open_at(&db).await.unwrap());
    storage.open("someone-else:cache").await.unwrap();
    let _reg = registered(&site("subpath-sw-v2"), &net, storage.clone()).await;
    let mut keys = storage.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["someone-else:cache", "subpath-sw-v2:shell"]);
}

#[tokio::test]
async fn waiting_worker_takes_over_on_skip_waiting() {
    let net = network();
    let network_dyn: Arc<dyn Transport> = net.clone();
    let storage: Arc<dyn CacheStorage> = Arc::new(MemoryCacheStorage::new());

    let v1_ctx = site("subpath-sw-v1");
    let reg = WorkerRegistration::new(v1_ctx.worker_scope(), Arc::clone(&network_dyn));
    let v1 = reg
        .register(v1_ctx.offline_worker(Arc::clone(&network_dyn), storage.clone()))
        .await;

    let mut config = SiteConfig::default();
    config.worker.version = "subpath-sw-v2".into();
    config.worker.skip_waiting_on_install = false;
    let v2_ctx = SiteContext::from_environment(config, PageEnvironment::from_html(url("/myapp/"), PAGE));
    let v2 = reg
        .register(v2_ctx.offline_worker(Arc::clone(&network_dyn), storage.clone()))
        .await;

    assert_eq!(v2.state(), WorkerState::Installed);
    assert_eq!(v1.state(), WorkerState::Activated);
    reg.post_message("SKIP_WAITING".parse::<WorkerMessage>().unwrap()).await;
    assert_eq!(v2.state(), WorkerState::Activated);
    assert_eq!(v1.state(), WorkerState::Redundant);
    assert!(!storage.has("subpath-sw-v1:shell").await.unwrap());
}
