//! In-process cache storage.

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use super::{entry_key, search_free_key, CacheStorage, MatchOptions};
use crate::error::CacheError;
use crate::transport::Response;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    search_free: String,
    response: Response,
}

#[derive(Debug, Default)]
struct Bucket {
    name: String,
    entries: Vec<Entry>,
}

impl Bucket {
    fn find(&self, url: &Url, opts: MatchOptions) -> Option<&Response> {
        let hit = if opts.ignore_search {
            let k = search_free_key(url);
            self.entries.iter().find(|e| e.search_free == k)
        } else {
            let k = entry_key(url);
            self.entries.iter().find(|e| e.key == k)
        };
        hit.map(|e| &e.response)
    }
}

/// Buckets held in memory for the life of the process, in creation order.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<Vec<Bucket>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|b| b.name == bucket) {
            buckets.push(Bucket {
                name: bucket.to_string(),
                entries: Vec::new(),
            });
        }
        Ok(())
    }

    async fn put(&self, bucket: &str, url: &Url, response: &Response) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().await;
        let idx = match buckets.iter().position(|b| b.name == bucket) {
            Some(i) => i,
            None => {
                buckets.push(Bucket {
                    name: bucket.to_string(),
                    entries: Vec::new(),
                });
                buckets.len() - 1
            }
        };
        let entry = Entry {
            key: entry_key(url),
            search_free: search_free_key(url),
            response: response.clone(),
        };
        let entries = &mut buckets[idx].entries;
        match entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn match_in(
        &self,
        bucket: &str,
        url: &Url,
        opts: MatchOptions,
    ) -> Result<Option<Response>, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|b| b.name == bucket)
            .and_then(|b| b.find(url, opts))
            .cloned())
    }

    async fn match_any(&self, url: &Url, opts: MatchOptions) -> Result<Option<Response>, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().find_map(|b| b.find(url, opts)).cloned())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().map(|b| b.name.clone()).collect())
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<String>, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| b.entries.iter().map(|e| e.key.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|b| b.name != bucket);
        Ok(buckets.len() != before)
    }

    async fn has(&self, bucket: &str) -> Result<bool, CacheError> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().any(|b| b.name == bucket))
    }
}
