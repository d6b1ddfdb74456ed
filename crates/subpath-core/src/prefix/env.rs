//! Page facts the prefix resolver reads.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

/// `<meta name="app-base" content="/myapp">` declares the prefix explicitly.
pub const PREFIX_META_NAME: &str = "app-base";

/// What the current document says about where it is deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEnvironment {
    /// Full document URL (`location.href`).
    pub location: Url,
    /// Explicit prefix declaration (page metadata or configuration).
    pub prefix_hint: Option<String>,
    /// Raw `<base href>` value, if the document has one.
    pub base_href: Option<String>,
    /// `src` of the currently executing script, when known.
    pub current_script: Option<String>,
    /// `src` of every script in the document, in document order.
    pub scripts: Vec<String>,
}

impl PageEnvironment {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            prefix_hint: None,
            base_href: None,
            current_script: None,
            scripts: Vec::new(),
        }
    }

    /// Replaces the page's own prefix declaration with an explicit one (config wins).
    pub fn with_prefix_hint(mut self, hint: Option<String>) -> Self {
        if hint.is_some() {
            self.prefix_hint = hint;
        }
        self
    }

    /// Scrapes prefix declarations out of an HTML document: the prefix meta tag,
    /// the first `<base href>`, and every `<script src>`.
    pub fn from_html(location: Url, html: &str) -> Self {
        let mut env = Self::new(location);

        env.prefix_hint = tags(html, "meta").into_iter().find_map(|attrs| {
            let is_prefix = attrs
                .get("name")
                .is_some_and(|n| n.eq_ignore_ascii_case(PREFIX_META_NAME));
            if is_prefix {
                attrs.get("content").cloned()
            } else {
                None
            }
        });
        env.base_href = tags(html, "base")
            .into_iter()
            .find_map(|mut attrs| attrs.remove("href"));
        env.scripts = tags(html, "script")
            .into_iter()
            .filter_map(|mut attrs| attrs.remove("src"))
            .filter(|src| !src.is_empty())
            .collect();

        env
    }
}

fn tag_regex(name: &str) -> Option<&'static Regex> {
    static META: OnceLock<Option<Regex>> = OnceLock::new();
    static BASE: OnceLock<Option<Regex>> = OnceLock::new();
    static SCRIPT: OnceLock<Option<Regex>> = OnceLock::new();
    let cell = match name {
        "meta" => &META,
        "base" => &BASE,
        "script" => &SCRIPT,
        _ => return None,
    };
    cell.get_or_init(|| Regex::new(&format!(r"(?is)<{name}\b([^>]*)>")).ok())
        .as_ref()
}

fn attr_regex() -> Option<&'static Regex> {
    static ATTR: OnceLock<Option<Regex>> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).ok()
    })
    .as_ref()
}

/// Attribute maps (lowercased names) of every `<name ...>` tag in `html`.
fn tags(html: &str, name: &str) -> Vec<HashMap<String, String>> {
    let (Some(tag_re), Some(attr_re)) = (tag_regex(name), attr_regex()) else {
        return Vec::new();
    };
    tag_re
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|body| {
            attr_re
                .captures_iter(body.as_str())
                .filter_map(|a| {
                    let key = a.get(1)?.as_str().to_ascii_lowercase();
                    let value = a.get(2).or_else(|| a.get(3)).or_else(|| a.get(4))?;
                    Some((key, value.as_str().trim().to_string()))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width">
  <META NAME="app-base" CONTENT="/myapp/">
  <base href='/myapp/'>
  <link rel="stylesheet" href="css/app.css">
</head>
<body>
  <div id="app"></div>
  <script>window.inline = true;</script>
  <script src="js/app.core.js"></script>
  <script defer src="/myapp/js/app.js?v=2"></script>
</body>
</html>"#;

    #[test]
    fn scrapes_declarations() {
        let loc = Url::parse("https://user.github.io/myapp/heroes").unwrap();
        let env = PageEnvironment::from_html(loc, PAGE);
        assert_eq!(env.prefix_hint.as_deref(), Some("/myapp/"));
        assert_eq!(env.base_href.as_deref(), Some("/myapp/"));
        assert_eq!(env.scripts, vec!["js/app.core.js", "/myapp/js/app.js?v=2"]);
        assert!(env.current_script.is_none());
    }

    #[test]
    fn empty_document_has_no_declarations() {
        let loc = Url::parse("https://host/").unwrap();
        let env = PageEnvironment::from_html(loc, "<html><body></body></html>");
        assert!(env.prefix_hint.is_none());
        assert!(env.base_href.is_none());
        assert!(env.scripts.is_empty());
    }

    #[test]
    fn explicit_hint_overrides_page() {
        let loc = Url::parse("https://host/myapp/").unwrap();
        let env = PageEnvironment::from_html(loc, PAGE).with_prefix_hint(Some("/cfg".into()));
        assert_eq!(env.prefix_hint.as_deref(), Some("/cfg"));
        let env = env.with_prefix_hint(None);
        assert_eq!(env.prefix_hint.as_deref(), Some("/cfg"));
    }
}
