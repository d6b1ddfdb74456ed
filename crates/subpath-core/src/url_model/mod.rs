//! URL classification and rewriting.
//!
//! Everything here is lexical: no network I/O and no knowledge of the page
//! beyond the deployment prefix carried by [`UrlRewriter`].

mod external;
pub mod markup;
mod path;
mod rewrite;

pub use external::normalize_external_href;
pub use path::{
    ensure_leading_slash, is_same_or_descendant, last_segment, last_segment_has_extension,
    strip_index_document, trim_trailing_slashes,
};
pub use rewrite::UrlRewriter;

/// Pseudo-schemes that never name a navigable same-origin document.
const PSEUDO_SCHEMES: &[&str] = &["data:", "blob:", "mailto:", "tel:", "sms:", "javascript:"];

/// Directories holding static resources that may be requested with a
/// legacy unprefixed path.
pub const RESOURCE_DIRS: &[&str] = &["data", "assets", "i18n"];

/// Directories holding scripts and stylesheets.
pub const CODE_DIRS: &[&str] = &["js", "css"];

/// How a URL string should be treated by the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// Cross-origin (`scheme://host`, `//host`) or a pseudo-scheme. Never rewritten.
    External,
    /// An address the router or user navigates to.
    InternalNavigation,
    /// A static artifact: data payload, media, script, stylesheet.
    InternalResource,
}

/// True if `url` is external: it carries `scheme://` (or is protocol-relative `//host`),
/// or uses a non-navigable pseudo-scheme such as `data:` or `mailto:`.
pub fn is_external(url: &str) -> bool {
    if url.starts_with("//") || has_scheme_authority(url) {
        return true;
    }
    has_pseudo_scheme(url)
}

/// `data:`, `blob:`, `mailto:` and friends. These never name a page of the app.
pub fn has_pseudo_scheme(url: &str) -> bool {
    PSEUDO_SCHEMES.iter().any(|p| starts_with_ignore_case(url, p))
}

fn has_scheme_authority(s: &str) -> bool {
    let Some(idx) = s.find("://") else {
        return false;
    };
    let scheme = &s[..idx];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub(crate) fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Classifies a URL string as external, an internal navigation target, or an
/// internal resource.
pub fn classify_url(url: &str) -> UrlKind {
    if is_external(url) {
        return UrlKind::External;
    }
    let path = url.split(['?', '#']).next().unwrap_or("");
    let abs = ensure_leading_slash(path);
    let in_family = RESOURCE_DIRS
        .iter()
        .chain(CODE_DIRS)
        .any(|dir| abs.contains(&format!("/{dir}/")));
    if in_family || last_segment_has_extension(&abs) {
        UrlKind::InternalResource
    } else {
        UrlKind::InternalNavigation
    }
}

/// Root-relative path families whose legacy unprefixed form gets corrected by
/// the request interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFamilies {
    dirs: Vec<String>,
    worker_script: String,
}

impl ResourceFamilies {
    pub fn new(worker_script: impl Into<String>) -> Self {
        Self {
            dirs: RESOURCE_DIRS.iter().map(|d| d.to_string()).collect(),
            worker_script: ensure_leading_slash(&worker_script.into()),
        }
    }

    pub fn worker_script(&self) -> &str {
        &self.worker_script
    }

    /// True if a root-relative `path` names a resource family member
    /// (`/data/...`, `/assets/...`, `/i18n/...`, or the worker script).
    pub fn matches(&self, path: &str) -> bool {
        if path == self.worker_script {
            return true;
        }
        self.dirs.iter().any(|dir| {
            path.strip_prefix('/')
                .and_then(|rest| rest.strip_prefix(dir.as_str()))
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Like [`matches`](Self::matches) but for bare relative forms such as `assets/x.png`.
    pub fn matches_relative(&self, raw: &str) -> bool {
        let rest = raw.strip_prefix("./").unwrap_or(raw);
        self.dirs.iter().any(|dir| {
            starts_with_ignore_case(rest, dir) && rest[dir.len()..].starts_with('/')
        })
    }
}

impl Default for ResourceFamilies {
    fn default() -> Self {
        Self::new("/sw.js")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_schemes() {
        for url in [
            "https://example.com/x",
            "HTTP://EXAMPLE.COM",
            "//cdn.example.com/lib.js",
            "ftp://files.example.com/a",
            "data:image/png;base64,AAAA",
            "blob:https://host/uuid",
            "mailto:me@example.com",
            "tel:+123",
            "javascript:void(0)",
        ] {
            assert!(is_external(url), "{url} should be external");
        }
    }

    #[test]
    fn internal_paths() {
        for url in ["/assets/x.png", "assets/x.png", "./data/a.json", "heroes", "", "/a://b"] {
            assert!(!is_external(url), "{url} should be internal");
        }
    }

    #[test]
    fn classify_kinds() {
        assert_eq!(classify_url("https://x.io/a"), UrlKind::External);
        assert_eq!(classify_url("/assets/x.png"), UrlKind::InternalResource);
        assert_eq!(classify_url("data/buildings/index.json"), UrlKind::InternalResource);
        assert_eq!(classify_url("/myapp/js/app.js"), UrlKind::InternalResource);
        assert_eq!(classify_url("/sw.js"), UrlKind::InternalResource);
        assert_eq!(classify_url("/heroes/charlie"), UrlKind::InternalNavigation);
        assert_eq!(classify_url("/tips?x=1#top"), UrlKind::InternalNavigation);
    }

    #[test]
    fn resource_families_absolute() {
        let fam = ResourceFamilies::default();
        assert!(fam.matches("/data/buildings/index.json"));
        assert!(fam.matches("/assets/x.png"));
        assert!(fam.matches("/i18n/en.json"));
        assert!(fam.matches("/sw.js"));
        assert!(!fam.matches("/database/x"));
        assert!(!fam.matches("/js/app.js"));
        assert!(!fam.matches("/myapp/assets/x.png"));
    }

    #[test]
    fn resource_families_relative() {
        let fam = ResourceFamilies::new("service-worker.js");
        assert_eq!(fam.worker_script(), "/service-worker.js");
        assert!(fam.matches_relative("assets/x.png"));
        assert!(fam.matches_relative("./data/a.json"));
        assert!(fam.matches_relative("I18N/ko.json"));
        assert!(!fam.matches_relative("heroes/x"));
        assert!(!fam.matches_relative("assetsx/y"));
    }
}
