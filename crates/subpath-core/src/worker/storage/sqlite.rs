//! SQLite-backed cache storage, so buckets survive process restarts.
//!
//! The database lives under the XDG state directory:
//! `~/.local/state/subpath/cache.db`.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

use super::{entry_key, search_free_key, CacheStorage, MatchOptions};
use crate::error::CacheError;
use crate::transport::{Headers, Response, ResponseKind};

/// Percent-encode a path for a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[derive(Clone)]
pub struct SqliteCacheStorage {
    pool: Pool<Sqlite>,
}

impl SqliteCacheStorage {
    /// Open (or create) the default cache database and run migrations.
    pub async fn open_default() -> Result<Self, CacheError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("subpath")?;
        let state_dir = xdg_dirs.get_state_home().join("subpath");
        Self::open_at(state_dir.join("cache.db")).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), CacheError> {
        // `search_free_url` is the URL without query or fragment, for ignore-search lookups.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS buckets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bucket_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                search_free_url TEXT NOT NULL,
                status INTEGER NOT NULL,
                headers_json TEXT NOT NULL,
                body BLOB NOT NULL,
                final_url TEXT,
                stored_at INTEGER NOT NULL,
                UNIQUE (bucket_id, url)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn bucket_id(&self, bucket: &str) -> Result<Option<i64>, CacheError> {
        let row = sqlx::query(r#"SELECT id FROM buckets WHERE name = ?1"#)
            .bind(bucket)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(r.try_get("id")?),
            None => None,
        })
    }
}

/// Decode an `entries` row back into a response.
fn row_to_response(row: &SqliteRow) -> Result<Response, CacheError> {
    let url: String = row.try_get("url")?;
    let status: i64 = row.try_get("status")?;
    let headers_json: String = row.try_get("headers_json")?;
    let body: Vec<u8> = row.try_get("body")?;
    let final_url: Option<String> = row.try_get("final_url")?;

    let status = u16::try_from(status).map_err(|_| CacheError::Corrupt {
        url: url.clone(),
        reason: format!("status {status} out of range"),
    })?;
    let pairs: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| CacheError::Corrupt {
            url: url.clone(),
            reason: format!("headers: {e}"),
        })?;

    Ok(Response {
        status,
        headers: pairs.into_iter().collect::<Headers>(),
        body,
        url: final_url.as_deref().and_then(|u| Url::parse(u).ok()),
        kind: ResponseKind::Basic,
    })
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        sqlx::query(r#"INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)"#)
            .bind(bucket)
            .bind(unix_timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn put(&self, bucket: &str, url: &Url, response: &Response) -> Result<(), CacheError> {
        let headers: Vec<(&str, &str)> = response.headers.iter().collect();
        let headers_json = serde_json::to_string(&headers).map_err(|e| CacheError::Corrupt {
            url: url.to_string(),
            reason: format!("headers: {e}"),
        })?;
        let now = unix_timestamp();

        let mut tx = self.pool.begin().await?;
        sqlx::query(r#"INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)"#)
            .bind(bucket)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query(r#"SELECT id FROM buckets WHERE name = ?1"#)
            .bind(bucket)
            .fetch_one(&mut *tx)
            .await?;
        let bucket_id: i64 = row.try_get("id")?;
        sqlx::query(
            r#"
            INSERT INTO entries
                (bucket_id, url, search_free_url, status, headers_json, body, final_url, stored_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (bucket_id, url) DO UPDATE SET
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                final_url = excluded.final_url,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(bucket_id)
        .bind(entry_key(url))
        .bind(search_free_key(url))
        .bind(i64::from(response.status))
        .bind(headers_json)
        .bind(response.body.as_slice())
        .bind(response.url.as_ref().map(|u| u.to_string()))
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn match_in(
        &self,
        bucket: &str,
        url: &Url,
        opts: MatchOptions,
    ) -> Result<Option<Response>, CacheError> {
        let (column, key) = if opts.ignore_search {
            ("search_free_url", search_free_key(url))
        } else {
            ("url", entry_key(url))
        };
        let sql = format!(
            r#"
            SELECT e.url, e.status, e.headers_json, e.body, e.final_url
            FROM entries e JOIN buckets b ON b.id = e.bucket_id
            WHERE b.name = ?1 AND e.{column} = ?2
            ORDER BY e.id
            LIMIT 1
            "#
        );
        let row = sqlx::query(&sql)
            .bind(bucket)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_response).transpose()
    }

    async fn match_any(&self, url: &Url, opts: MatchOptions) -> Result<Option<Response>, CacheError> {
        let (column, key) = if opts.ignore_search {
            ("search_free_url", search_free_key(url))
        } else {
            ("url", entry_key(url))
        };
        let sql = format!(
            r#"
            SELECT e.url, e.status, e.headers_json, e.body, e.final_url
            FROM entries e JOIN buckets b ON b.id = e.bucket_id
            WHERE e.{column} = ?1
            ORDER BY b.id, e.id
            LIMIT 1
            "#
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_response).transpose()
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let rows = sqlx::query(r#"SELECT name FROM buckets ORDER BY id"#)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.try_get("name")?);
        }
        Ok(out)
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<String>, CacheError> {
        let rows = sqlx::query(
            r#"
            SELECT e.url FROM entries e JOIN buckets b ON b.id = e.bucket_id
            WHERE b.name = ?1
            ORDER BY e.id
            "#,
        )
        .bind(bucket)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.try_get("url")?);
        }
        Ok(out)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        let Some(id) = self.bucket_id(bucket).await? else {
            return Ok(false);
        };
        let mut tx = self.pool.begin().await?;
        sqlx::query(r#"DELETE FROM entries WHERE bucket_id = ?1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM buckets WHERE id = ?1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn has(&self, bucket: &str) -> Result<bool, CacheError> {
        Ok(self.bucket_id(bucket).await?.is_some())
    }
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<SqliteCacheStorage, CacheError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let store = SqliteCacheStorage { pool };
    store.migrate().await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn stores_full_response() {
        let store = open_memory().await.unwrap();
        let u = url("https://host/myapp/index.html");
        let resp = Response::new(200, "<!doctype html>")
            .with_header("Content-Type", "text/html")
            .with_url(u.clone());
        store.put("v1:shell", &u, &resp).await.unwrap();

        let hit = store
            .match_in("v1:shell", &u, MatchOptions::exact())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit, resp);
    }

    #[tokio::test]
    async fn ignore_search_and_overwrite() {
        let store = open_memory().await.unwrap();
        let u = url("https://host/js/app.js?v=1");
        store.put("code", &u, &Response::new(200, "a")).await.unwrap();
        store.put("code", &u, &Response::new(200, "b")).await.unwrap();
        assert_eq!(store.entries("code").await.unwrap(), vec![u.to_string()]);

        let probe = url("https://host/js/app.js");
        assert!(store
            .match_in("code", &probe, MatchOptions::exact())
            .await
            .unwrap()
            .is_none());
        let hit = store
            .match_any(&probe, MatchOptions::ignore_search())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.body, b"b");
    }

    #[tokio::test]
    async fn bucket_lifecycle() {
        let store = open_memory().await.unwrap();
        store.open("v1:shell").await.unwrap();
        store
            .put("v1:data", &url("https://host/data/a.json"), &Response::new(200, "{}"))
            .await
            .unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["v1:shell", "v1:data"]);
        assert!(store.delete("v1:data").await.unwrap());
        assert!(!store.has("v1:data").await.unwrap());
        assert!(store
            .match_any(&url("https://host/data/a.json"), MatchOptions::exact())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete("v1:data").await.unwrap());
    }

    #[tokio::test]
    async fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested dir").join("cache.db");
        let u = url("https://host/assets/x.png");
        {
            let store = SqliteCacheStorage::open_at(&path).await.unwrap();
            store.put("v1:assets", &u, &Response::new(200, "png")).await.unwrap();
        }
        let store = SqliteCacheStorage::open_at(&path).await.unwrap();
        let hit = store
            .match_in("v1:assets", &u, MatchOptions::exact())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.body, b"png");
    }

    #[test]
    fn sqlite_uri_escapes_specials() {
        let uri = path_to_sqlite_uri(Path::new("/tmp/a b#c.db"));
        assert_eq!(uri, "sqlite:///tmp/a%20b%23c.db");
    }
}
