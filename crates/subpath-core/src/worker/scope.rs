//! The URL space one worker controls.

use url::Url;

use crate::route::AppPath;

/// Origin plus a path ending in `/`. A request is in scope when it shares the
/// origin and its path starts with the scope path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    url: Url,
}

impl Scope {
    /// Normalizes `url` into a scope: query and fragment dropped, trailing `/` ensured.
    pub fn new(mut url: Url) -> Self {
        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `/myapp/` (always ends with `/`).
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn contains(&self, url: &Url) -> bool {
        url.origin() == self.url.origin() && url.path().starts_with(self.path())
    }

    /// App path of an in-scope URL (`/myapp/tips/lootbar/` -> `/tips/lootbar`).
    pub fn app_path_of(&self, url: &Url) -> AppPath {
        let path = url.path();
        let rest = path
            .strip_prefix(self.path())
            .unwrap_or(path);
        AppPath::normalize(rest)
    }

    /// The scope root and `scope + shell_document`, the two addresses of the shell.
    pub fn shell_urls(&self, shell_document: &str) -> Vec<Url> {
        let mut urls = vec![self.url.clone()];
        let doc = shell_document.trim_start_matches('/');
        if !doc.is_empty() {
            match self.url.join(doc) {
                Ok(u) => urls.push(u),
                Err(e) => {
                    tracing::warn!(shell_document, error = %e, "unusable shell document name")
                }
            }
        }
        urls
    }
}
