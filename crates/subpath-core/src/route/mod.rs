//! Mapping between physical location paths and application routes.
//!
//! The address bar shows `/myapp/heroes/charlie/`; the router reasons about
//! `/heroes/charlie`. [`RouteMapper`] converts both ways.

mod known;
pub mod redirect;

use std::fmt;
use url::Url;

pub use known::KnownRoutes;

use crate::prefix::DeploymentPrefix;
use crate::url_model::{ensure_leading_slash, has_pseudo_scheme, strip_index_document, trim_trailing_slashes};

/// Prefix-independent route path: starts with `/`, no trailing `/` unless it is `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppPath(String);

impl AppPath {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalizes any path-like string: leading `/`, trailing slashes collapsed.
    pub fn normalize(raw: &str) -> Self {
        let with_slash = ensure_leading_slash(raw);
        let trimmed = trim_trailing_slashes(&with_slash);
        if trimmed.is_empty() {
            Self::root()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl fmt::Display for AppPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts between location paths and [`AppPath`]s for one deployment.
#[derive(Debug, Clone)]
pub struct RouteMapper {
    prefix: DeploymentPrefix,
    routes: KnownRoutes,
}

impl RouteMapper {
    pub fn new(prefix: DeploymentPrefix, routes: KnownRoutes) -> Self {
        Self { prefix, routes }
    }

    pub fn prefix(&self) -> &DeploymentPrefix {
        &self.prefix
    }

    pub fn routes(&self) -> &KnownRoutes {
        &self.routes
    }

    /// `/myapp/heroes/` -> `/heroes`, `/myapp/index.html` -> `/`.
    pub fn to_app_path(&self, location_path: &str) -> AppPath {
        let p = strip_index_document(location_path);
        let p = self.prefix.strip_from(p);
        AppPath::normalize(p)
    }

    /// Resolves a possibly-relative href against `current` and maps it to an app path.
    ///
    /// `None` for fragments, pseudo-schemes and other origins. An empty href means `/`.
    pub fn app_path_from_href(&self, href: &str, current: &Url) -> Option<AppPath> {
        let h = href.trim();
        if h.is_empty() {
            return Some(AppPath::root());
        }
        if h.starts_with('#') {
            return None;
        }
        // blob:https://host/... carries a same-origin URL inside; reject before joining.
        if has_pseudo_scheme(h) {
            return None;
        }

        match current.join(h) {
            Ok(u) => {
                if u.origin() != current.origin() {
                    return None;
                }
                Some(self.to_app_path(u.path()))
            }
            Err(e) => {
                tracing::debug!(href = h, error = %e, "href did not resolve; mapping lexically");
                Some(self.to_app_path(h.split(['?', '#']).next().unwrap_or(h)))
            }
        }
    }

    pub fn is_known_app_route(&self, app_path: &AppPath) -> bool {
        self.routes.contains(app_path)
    }

    /// Inverse of [`to_app_path`](Self::to_app_path): `/heroes` -> `/myapp/heroes`, `/` -> `/myapp/`.
    pub fn to_location_path(&self, app_path: &AppPath) -> String {
        format!("{}{}", self.prefix.as_str(), app_path.as_str())
    }

    /// A full reload is only safe where the static host has a physical document:
    /// the app root, an explicit index document, or the bare prefix.
    pub fn is_safe_hard_reload(&self, location_path: &str) -> bool {
        if self.to_app_path(location_path).is_root() {
            return true;
        }
        strip_index_document(location_path) != location_path
    }
}
