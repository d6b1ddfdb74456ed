//! Prefix correction for resource references embedded in page markup.
//!
//! Authored markup often hardcodes `/assets/...` for a root deployment. When the
//! site is served from a sub-path those references 404; these helpers rewrite
//! them the same way the request interceptor rewrites fetches.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;
use url::Url;

use super::{is_external, ResourceFamilies, UrlRewriter};
use crate::route::RouteMapper;

/// Attributes that carry resource references.
pub const REWRITTEN_ATTRIBUTES: &[&str] = &["src", "href", "poster"];

fn style_url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(['"]?)(/(?:assets|data|i18n)/[^'")]+)(['"]?)\s*\)"#).ok()
    })
    .as_ref()
}

/// Rewrites markup references for one document.
#[derive(Debug, Clone, Copy)]
pub struct MarkupRewriter<'a> {
    rewriter: &'a UrlRewriter,
    mapper: &'a RouteMapper,
    families: &'a ResourceFamilies,
    location: &'a Url,
}

impl<'a> MarkupRewriter<'a> {
    pub fn new(
        rewriter: &'a UrlRewriter,
        mapper: &'a RouteMapper,
        families: &'a ResourceFamilies,
        location: &'a Url,
    ) -> Self {
        Self {
            rewriter,
            mapper,
            families,
            location,
        }
    }

    /// Corrected value for an attribute of `element` (tag name, any case),
    /// or `None` when the value should stay as authored.
    ///
    /// Only resource-family references are touched, either root-relative
    /// (`/assets/x.png`, the worker script) or bare (`assets/x.png`). Anchor
    /// hrefs that name a known app route are left to the router.
    pub fn rewrite_attribute(&self, element: &str, attribute: &str, value: &str) -> Option<String> {
        let v = value.trim();
        if v.is_empty() || v.starts_with('#') || is_external(v) {
            return None;
        }
        if !REWRITTEN_ATTRIBUTES
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
        {
            return None;
        }

        if element.eq_ignore_ascii_case("a") && attribute.eq_ignore_ascii_case("href") {
            let owned_by_router = self
                .mapper
                .app_path_from_href(v, self.location)
                .is_some_and(|ap| self.mapper.is_known_app_route(&ap));
            if owned_by_router {
                return None;
            }
        }

        let path = v.split(['?', '#']).next().unwrap_or(v);
        if !self.families.matches(path) && !self.families.matches_relative(v) {
            return None;
        }
        let out = self.rewriter.to_resource_url(v);
        (out != v).then_some(out)
    }

    /// Rewrites `url(/assets/...)`, `url('/data/...')` and `url("/i18n/...")`
    /// references in an inline style. Mismatched quotes are left alone.
    pub fn rewrite_style_urls<'s>(&self, style: &'s str) -> Cow<'s, str> {
        if !style.to_ascii_lowercase().contains("url(") {
            return Cow::Borrowed(style);
        }
        let Some(re) = style_url_regex() else {
            return Cow::Borrowed(style);
        };
        re.replace_all(style, |caps: &Captures<'_>| {
            let open = caps.get(1).map_or("", |m| m.as_str());
            let close = caps.get(3).map_or("", |m| m.as_str());
            let whole = caps.get(0).map_or("", |m| m.as_str());
            if open != close {
                return whole.to_string();
            }
            let path = caps.get(2).map_or("", |m| m.as_str());
            format!("url({open}{}{close})", self.rewriter.to_resource_url(path))
        })
    }
}
