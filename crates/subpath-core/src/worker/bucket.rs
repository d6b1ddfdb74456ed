//! Versioned cache bucket names: `<version>:<category>`.
//!
//! The version token is the only thing the activation sweep looks at, so the
//! format must stay stable across releases.

use std::fmt;
use std::str::FromStr;

/// Content partition of the offline cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheCategory {
    /// Entry document served for client-side routes.
    Shell,
    /// Recently navigated documents.
    Html,
    Assets,
    /// JSON and translation payloads.
    Data,
    /// Scripts and stylesheets.
    Code,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 5] = [
        CacheCategory::Shell,
        CacheCategory::Html,
        CacheCategory::Assets,
        CacheCategory::Data,
        CacheCategory::Code,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheCategory::Shell => "shell",
            CacheCategory::Html => "html",
            CacheCategory::Assets => "assets",
            CacheCategory::Data => "data",
            CacheCategory::Code => "code",
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown cache category: {s}"))
    }
}

/// A parsed bucket name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName {
    pub version: String,
    pub category: CacheCategory,
}

impl BucketName {
    pub fn new(version: impl Into<String>, category: CacheCategory) -> Self {
        Self {
            version: version.into(),
            category,
        }
    }

    /// Splits on the last `:`; `None` for names this subsystem did not write.
    pub fn parse(name: &str) -> Option<Self> {
        let (version, category) = name.rsplit_once(':')?;
        if version.is_empty() {
            return None;
        }
        Some(Self {
            version: version.to_string(),
            category: category.parse().ok()?,
        })
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.version, self.category)
    }
}

/// Bucket name for `category` under `version`.
pub fn bucket_name(version: &str, category: CacheCategory) -> String {
    BucketName::new(version, category).to_string()
}

/// True if `name` belongs to `family` but was written by a version other than `current`.
///
/// Only the version token is compared, so `v1.0.0:shell` is not mistaken for
/// current when the running version is `v1.0`. Names outside the family are
/// never stale.
pub fn is_stale(name: &str, current: &str, family: &str) -> bool {
    if !name.starts_with(family) {
        return false;
    }
    let version = name.rsplit_once(':').map_or(name, |(v, _)| v);
    version != current
}
