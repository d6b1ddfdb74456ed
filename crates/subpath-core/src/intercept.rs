//! Request interception: a [`Transport`] decorator that repairs legacy
//! unprefixed resource paths before they reach the network.
//!
//! Page code written for a root deployment fetches `/data/heroes.json`. Under a
//! `/myapp` deployment that 404s, so [`RewritingTransport`] turns it into
//! `/myapp/data/heroes.json`. Only same-origin resource families are touched,
//! and a target that cannot be understood is sent exactly as given.

use async_trait::async_trait;
use url::Url;

use crate::error::{FetchChainError, TransportError};
use crate::transport::{CacheDirective, Headers, Method, Request, RequestMode, Response, Transport};
use crate::url_model::{is_external, ResourceFamilies, UrlRewriter};

/// What page code hands to fetch: a URL string or a prepared request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    Url(String),
    Request(Request),
}

impl From<&str> for RequestTarget {
    fn from(s: &str) -> Self {
        RequestTarget::Url(s.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(s: String) -> Self {
        RequestTarget::Url(s)
    }
}

impl From<Request> for RequestTarget {
    fn from(r: Request) -> Self {
        RequestTarget::Request(r)
    }
}

/// Per-call overrides. Unset fields keep the target's own values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInit {
    pub method: Option<Method>,
    pub mode: Option<RequestMode>,
    pub headers: Option<Headers>,
    pub body: Option<Vec<u8>>,
    pub cache: Option<CacheDirective>,
}

impl RequestInit {
    pub fn no_store() -> Self {
        Self {
            cache: Some(CacheDirective::NoStore),
            ..Self::default()
        }
    }

    fn apply(self, mut req: Request) -> Request {
        if let Some(m) = self.method {
            req.method = m;
        }
        if let Some(m) = self.mode {
            req.mode = m;
        }
        if let Some(h) = self.headers {
            req.headers = h;
        }
        if let Some(b) = self.body {
            req.body = Some(b);
        }
        if let Some(c) = self.cache {
            req.cache = c;
        }
        req
    }
}

/// Successful result of [`RewritingTransport::fetch_first_ok`].
#[derive(Debug, Clone)]
pub struct FirstOk {
    pub response: Response,
    /// Absolute URL that answered.
    pub used_url: String,
    /// Every URL tried, the winner last.
    pub attempted: Vec<String>,
}

/// Wraps a transport and rewrites same-origin resource-family requests onto
/// the deployment prefix.
#[derive(Debug, Clone)]
pub struct RewritingTransport<T> {
    inner: T,
    rewriter: UrlRewriter,
    families: ResourceFamilies,
    /// Deployment root (`https://host/myapp/`); relative targets resolve against it.
    base: Url,
}

impl<T: Transport> RewritingTransport<T> {
    pub fn new(inner: T, rewriter: UrlRewriter, families: ResourceFamilies, base: Url) -> Self {
        Self {
            inner,
            rewriter,
            families,
            base,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn should_rewrite(&self, path: &str) -> bool {
        !self.rewriter.prefix().contains(path) && self.families.matches(path)
    }

    /// Rewritten form of a string target, or the input unchanged.
    pub fn rewrite_target(&self, raw: &str) -> String {
        if raw.is_empty() || is_external(raw) {
            return raw.to_string();
        }
        match self.base.join(raw) {
            Ok(url) => {
                if url.origin() != self.base.origin() || !self.should_rewrite(url.path()) {
                    return raw.to_string();
                }
                let mut out = url;
                let path = self.rewriter.to_resource_url(out.path());
                out.set_path(&path);
                out.to_string()
            }
            Err(e) => {
                tracing::debug!(target = raw, error = %e, "fetch target did not parse; rewriting lexically");
                self.rewrite_lexically(raw)
            }
        }
    }

    fn rewrite_lexically(&self, raw: &str) -> String {
        let path = raw.split(['?', '#']).next().unwrap_or(raw);
        if raw.starts_with('/') {
            if self.should_rewrite(path) {
                return self.rewriter.to_resource_url(raw);
            }
        } else if self.families.matches_relative(raw) {
            return self.rewriter.to_resource_url(raw);
        }
        raw.to_string()
    }

    /// Same as [`rewrite_target`](Self::rewrite_target) for an already absolute URL.
    pub fn rewrite_url(&self, url: &Url) -> Url {
        if url.origin() != self.base.origin() || !self.should_rewrite(url.path()) {
            return url.clone();
        }
        let mut out = url.clone();
        let path = self.rewriter.to_resource_url(url.path());
        out.set_path(&path);
        out
    }

    /// Builds the outgoing request for `target`, rewriting its URL and applying `init`.
    pub fn prepare(&self, target: RequestTarget, init: RequestInit) -> Result<Request, TransportError> {
        let req = match target {
            RequestTarget::Url(raw) => {
                let rewritten = self.rewrite_target(&raw);
                let url = self
                    .base
                    .join(&rewritten)
                    .map_err(|e| TransportError::InvalidUrl {
                        url: raw.clone(),
                        reason: e.to_string(),
                    })?;
                Request::get(url)
            }
            RequestTarget::Request(mut req) => {
                let url = self.rewrite_url(&req.url);
                if url != req.url {
                    tracing::debug!(from = %req.url, to = %url, "rewrote request");
                    req.url = url;
                }
                req
            }
        };
        Ok(init.apply(req))
    }

    /// Fetch-style entry point: string or request target plus overrides.
    pub async fn fetch_target(
        &self,
        target: impl Into<RequestTarget>,
        init: RequestInit,
    ) -> Result<Response, TransportError> {
        let req = self.prepare(target.into(), init)?;
        self.inner.fetch(req).await
    }

    /// Tries each candidate path in order (bypassing HTTP caches) and returns
    /// the first 2xx response.
    pub async fn fetch_first_ok(&self, candidates: &[&str]) -> Result<FirstOk, FetchChainError> {
        let mut attempted = Vec::new();
        let mut last = String::from("no candidates");

        for raw in candidates {
            let abs = self.rewriter.to_resource_url(raw);
            let url = match self.base.join(&abs) {
                Ok(u) => u,
                Err(e) => {
                    attempted.push(abs);
                    last = e.to_string();
                    continue;
                }
            };
            attempted.push(url.to_string());
            let req = Request::get(url.clone()).with_cache(CacheDirective::NoStore);
            match self.inner.fetch(req).await {
                Ok(resp) if resp.is_ok() => {
                    return Ok(FirstOk {
                        response: resp,
                        used_url: url.to_string(),
                        attempted,
                    });
                }
                Ok(resp) => last = format!("HTTP {}", resp.status),
                Err(e) => last = e.to_string(),
            }
            tracing::debug!(url = %url, reason = %last, "candidate failed");
        }

        Err(FetchChainError { attempted, last })
    }
}

#[async_trait]
impl<T: Transport> Transport for RewritingTransport<T> {
    async fn fetch(&self, request: Request) -> Result<Response, TransportError> {
        let req = self.prepare(RequestTarget::Request(request), RequestInit::default())?;
        self.inner.fetch(req).await
    }
}
