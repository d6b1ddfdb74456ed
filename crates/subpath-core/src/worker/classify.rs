//! Request classification: which handling policy an in-scope request gets.

use std::fmt;

use super::scope::Scope;
use crate::route::KnownRoutes;
use crate::transport::{Request, RequestMode};
use crate::url_model::last_segment_has_extension;

/// How the worker treats one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClassification {
    /// Programmatic fetch of a client-side route: answer with the shell.
    SpaFetchFallback,
    Navigation,
    Data,
    Asset,
    Code,
    Default,
}

impl RouteClassification {
    pub const ALL: [RouteClassification; 6] = [
        RouteClassification::SpaFetchFallback,
        RouteClassification::Navigation,
        RouteClassification::Data,
        RouteClassification::Asset,
        RouteClassification::Code,
        RouteClassification::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteClassification::SpaFetchFallback => "spa-fetch-fallback",
            RouteClassification::Navigation => "navigation",
            RouteClassification::Data => "data",
            RouteClassification::Asset => "asset",
            RouteClassification::Code => "code",
            RouteClassification::Default => "default",
        }
    }
}

impl fmt::Display for RouteClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_navigation(req: &Request) -> bool {
    req.mode == RequestMode::Navigate || req.accepts_html()
}

pub fn is_data_path(path: &str) -> bool {
    path.contains("/data/") || path.contains("/i18n/")
}

pub fn is_asset_path(path: &str) -> bool {
    path.contains("/assets/")
}

pub fn is_code_path(path: &str) -> bool {
    path.contains("/js/") || path.contains("/css/") || path.ends_with(".js") || path.ends_with(".css")
}

/// Classifies an in-scope request. Checks run in priority order; the first match wins.
pub fn classify(req: &Request, scope: &Scope, routes: &KnownRoutes) -> RouteClassification {
    let path = req.url.path();
    let navigation = is_navigation(req);

    if !navigation
        && !is_data_path(path)
        && !is_asset_path(path)
        && !is_code_path(path)
        && !last_segment_has_extension(path)
        && routes.contains(&scope.app_path_of(&req.url))
    {
        return RouteClassification::SpaFetchFallback;
    }
    if navigation {
        return RouteClassification::Navigation;
    }
    if is_data_path(path) {
        return RouteClassification::Data;
    }
    if is_asset_path(path) {
        return RouteClassification::Asset;
    }
    if is_code_path(path) {
        return RouteClassification::Code;
    }
    RouteClassification::Default
}
