//! Prefix-aware URL rewriting.

use super::is_external;
use super::path::ensure_leading_slash;
use crate::prefix::DeploymentPrefix;

/// Produces deployment-correct absolute paths from raw internal paths.
///
/// Navigation and resource URLs currently share one algorithm, but callers
/// must pick the entry point that matches their intent so the two can diverge
/// (e.g. assets served from a separate CDN prefix) without touching call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRewriter {
    prefix: DeploymentPrefix,
}

impl UrlRewriter {
    pub fn new(prefix: DeploymentPrefix) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &DeploymentPrefix {
        &self.prefix
    }

    /// Address the router or user navigates to (`/heroes` -> `/myapp/heroes`).
    pub fn to_navigation_url(&self, path: &str) -> String {
        self.apply_prefix(path)
    }

    /// Static artifact reference (`/assets/x.png` -> `/myapp/assets/x.png`).
    pub fn to_resource_url(&self, path: &str) -> String {
        self.apply_prefix(path)
    }

    fn apply_prefix(&self, raw: &str) -> String {
        if raw.is_empty() || is_external(raw) {
            return raw.to_string();
        }
        let norm = ensure_leading_slash(raw);
        if self.prefix.is_root() || self.prefix.contains(&norm) {
            return norm;
        }
        format!("{}{}", self.prefix.as_str(), norm)
    }
}
