//! Known client-side route prefixes.

use super::AppPath;
use crate::url_model::is_same_or_descendant;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoutePattern {
    /// Only this exact path.
    Exact(String),
    /// This path or anything below it.
    Tree(String),
    /// Anything starting with this string (registered as `"/news/"`).
    Prefix(String),
}

impl RoutePattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(p) => path == p,
            RoutePattern::Tree(p) => is_same_or_descendant(path, p),
            RoutePattern::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

/// The routes the client-side router owns. Used to decide whether a link is
/// handled in-page and whether an extensionless request is a client route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownRoutes {
    patterns: Vec<RoutePattern>,
}

impl KnownRoutes {
    /// No routes at all, not even `/`.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Registers a runtime extension.
    ///
    /// A value ending in `/` matches every path starting with it; anything else
    /// matches itself and its descendants. Blank values are ignored.
    pub fn register(&mut self, route: &str) {
        let s = route.trim();
        if s.is_empty() {
            return;
        }
        let pattern = if s.ends_with('/') {
            RoutePattern::Prefix(s.to_string())
        } else {
            RoutePattern::Tree(s.to_string())
        };
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Builder form of [`register`](Self::register) for a batch of extensions.
    pub fn with_extensions<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for r in routes {
            self.register(r.as_ref());
        }
        self
    }

    pub fn contains(&self, path: &AppPath) -> bool {
        self.contains_path(path.as_str())
    }

    pub(crate) fn contains_path(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

impl Default for KnownRoutes {
    /// `/`, `/buildings/**`, `/heroes/**`, `/tips/**`, `/tools/**`, `/lootbar`.
    fn default() -> Self {
        let mut patterns = vec![RoutePattern::Exact("/".into())];
        for tree in ["/buildings", "/heroes", "/tips", "/tools"] {
            patterns.push(RoutePattern::Tree(tree.into()));
        }
        patterns.push(RoutePattern::Exact("/lootbar".into()));
        Self { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(p: &str) -> bool {
        KnownRoutes::default().contains_path(p)
    }

    #[test]
    fn defaults() {
        assert!(known("/"));
        assert!(known("/heroes"));
        assert!(known("/heroes/charlie"));
        assert!(known("/tips/lootbar"));
        assert!(known("/tools/calculator/x"));
        assert!(known("/lootbar"));
        assert!(!known("/lootbar/x"));
        assert!(!known("/heroesx"));
        assert!(!known("/coupons"));
    }

    #[test]
    fn extensions() {
        let routes = KnownRoutes::default().with_extensions(["/coupons", "/news/", "  "]);
        assert!(routes.contains_path("/coupons"));
        assert!(routes.contains_path("/coupons/today"));
        assert!(!routes.contains_path("/couponsx"));
        assert!(routes.contains_path("/news/1"));
        assert!(!routes.contains_path("/news"));
    }

    #[test]
    fn empty_knows_nothing() {
        assert!(!KnownRoutes::empty().contains_path("/"));
    }

    #[test]
    fn register_is_deduplicated() {
        let mut routes = KnownRoutes::empty();
        routes.register("/a");
        routes.register("/a");
        assert_eq!(routes.patterns.len(), 1);
    }
}
