//! Named cache buckets of request URL -> response.
//!
//! Mirrors the browser cache storage surface the worker needs: lazily created
//! buckets, exact or search-insensitive matching, and whole-bucket deletion.
//! Entries are keyed by URL without its fragment; writes are last-write-wins.

mod memory;
mod sqlite;

use async_trait::async_trait;
use url::Url;

use crate::error::CacheError;
use crate::transport::Response;

pub use memory::MemoryCacheStorage;
pub use sqlite::SqliteCacheStorage;

/// How a lookup compares URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    /// Ignore the query string on both sides.
    pub ignore_search: bool,
}

impl MatchOptions {
    pub fn exact() -> Self {
        Self { ignore_search: false }
    }

    pub fn ignore_search() -> Self {
        Self { ignore_search: true }
    }
}

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates the bucket if missing.
    async fn open(&self, bucket: &str) -> Result<(), CacheError>;

    /// Stores `response` under `url`, creating the bucket on first write.
    async fn put(&self, bucket: &str, url: &Url, response: &Response) -> Result<(), CacheError>;

    /// Looks `url` up in one bucket. A missing bucket is a miss.
    async fn match_in(
        &self,
        bucket: &str,
        url: &Url,
        opts: MatchOptions,
    ) -> Result<Option<Response>, CacheError>;

    /// Looks `url` up in every bucket, oldest bucket first.
    async fn match_any(&self, url: &Url, opts: MatchOptions) -> Result<Option<Response>, CacheError>;

    /// Bucket names in creation order.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// URLs stored in `bucket`, in insertion order.
    async fn entries(&self, bucket: &str) -> Result<Vec<String>, CacheError>;

    /// Deletes a bucket and everything in it. `false` if it did not exist.
    async fn delete(&self, bucket: &str) -> Result<bool, CacheError>;

    async fn has(&self, bucket: &str) -> Result<bool, CacheError>;
}

/// Storage key: the URL without its fragment.
pub(crate) fn entry_key(url: &Url) -> String {
    let mut u = url.clone();
    u.set_fragment(None);
    u.to_string()
}

/// Key with the query string dropped as well, for `ignore_search` matching.
pub(crate) fn search_free_key(url: &Url) -> String {
    let mut u = url.clone();
    u.set_fragment(None);
    u.set_query(None);
    u.to_string()
}
