//! Deployment prefix resolution.
//!
//! The prefix is the sub-path the whole app is served under (`/myapp` for a
//! project-pages deployment, empty at a domain root). It is resolved once from
//! what the page declares about itself, in strict order:
//!
//! 1. an explicit prefix hint (config value or page metadata),
//! 2. the document `<base href>`,
//! 3. the location of the entry script (everything before its `/js/` directory),
//! 4. the domain root.
//!
//! Each step is a pure function of [`PageEnvironment`] and swallows its own
//! parse failures, so resolution itself cannot fail.

mod env;
mod steps;

use std::fmt;
use std::sync::OnceLock;

pub use env::PageEnvironment;
pub use steps::{from_base_href, from_entry_script, from_prefix_hint, STEPS};

use crate::url_model::{ensure_leading_slash, trim_trailing_slashes};

/// Normalized deployment prefix: empty, or `/segment[/segment...]` with no trailing slash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DeploymentPrefix(String);

impl DeploymentPrefix {
    /// Prefix for an app served at the domain root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalizes a raw prefix: ensures a leading `/` (dropping a leading `./`),
    /// strips trailing slashes, and maps `/` to the root prefix.
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::root();
        }
        let with_slash = ensure_leading_slash(raw);
        Self::from_path(&with_slash)
    }

    /// Builds a prefix from an absolute path by stripping trailing slashes.
    pub(crate) fn from_path(path: &str) -> Self {
        let trimmed = trim_trailing_slashes(path);
        if trimmed.is_empty() || trimmed == "/" {
            Self::root()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `path` already sits under this prefix (`/myapp/...`).
    ///
    /// Always false for the root prefix.
    pub fn contains(&self, path: &str) -> bool {
        !self.is_root()
            && path
                .strip_prefix(self.0.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Removes the prefix from a location path. `/myapp` and `/myapp/` both map to `/`;
    /// paths outside the prefix are returned unchanged.
    pub fn strip_from<'a>(&self, path: &'a str) -> &'a str {
        if self.is_root() {
            return path;
        }
        if path == self.0 {
            return "/";
        }
        if self.contains(path) {
            return &path[self.0.len()..];
        }
        path
    }
}

impl fmt::Display for DeploymentPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which resolution step produced the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixSource {
    Hint,
    BaseHref,
    EntryScript,
    Default,
}

impl PrefixSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefixSource::Hint => "hint",
            PrefixSource::BaseHref => "base-href",
            PrefixSource::EntryScript => "entry-script",
            PrefixSource::Default => "default",
        }
    }
}

/// Resolves the prefix by trying each step in order; the first success wins.
pub fn resolve_prefix(env: &PageEnvironment) -> (DeploymentPrefix, PrefixSource) {
    for (source, step) in STEPS {
        if let Some(prefix) = step(env) {
            tracing::debug!(source = source.as_str(), prefix = %prefix, "deployment prefix resolved");
            return (prefix, *source);
        }
    }
    tracing::debug!("no prefix declared or inferable; assuming root deployment");
    (DeploymentPrefix::root(), PrefixSource::Default)
}

/// Write-once holder for the resolved prefix.
///
/// The first call to [`resolve`](Self::resolve) runs the step chain; every later
/// call returns the memoized value, whatever environment it is given.
#[derive(Debug, Default)]
pub struct PrefixResolver {
    resolved: OnceLock<(DeploymentPrefix, PrefixSource)>,
}

impl PrefixResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, env: &PageEnvironment) -> &DeploymentPrefix {
        &self.resolved.get_or_init(|| resolve_prefix(env)).0
    }

    pub fn source(&self) -> Option<PrefixSource> {
        self.resolved.get().map(|(_, source)| *source)
    }
}
