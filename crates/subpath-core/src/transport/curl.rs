//! libcurl-backed [`Transport`].
//!
//! Each request runs a blocking `Easy` handle on tokio's blocking pool.

use ::curl::easy::{Easy, List};
use async_trait::async_trait;
use std::str;
use std::time::Duration;
use url::Url;

use super::{Headers, Method, Request, Response, ResponseKind, Transport};
use crate::config::TransportConfig;
use crate::error::TransportError;

/// Real network transport. Follows redirects; HTTP error statuses are returned
/// as responses, only transfer failures become errors.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    timeout: Duration,
    max_redirections: u32,
}

impl CurlTransport {
    pub fn new(cfg: &TransportConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_redirections: cfg.max_redirections,
        }
    }

    fn perform(&self, request: &Request) -> Result<Response, TransportError> {
        let url = request.url.as_str();
        let net = |e: ::curl::Error| TransportError::network(url, e.to_string());

        let mut easy = Easy::new();
        easy.url(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        match &request.method {
            Method::Get => easy.get(true).map_err(net)?,
            Method::Head => easy.nobody(true).map_err(net)?,
            Method::Post => {
                easy.post(true).map_err(net)?;
                easy.post_fields_copy(request.body.as_deref().unwrap_or_default())
                    .map_err(net)?;
            }
            other => {
                easy.custom_request(other.as_str()).map_err(net)?;
                if let Some(body) = request.body.as_deref() {
                    easy.post_fields_copy(body).map_err(net)?;
                }
            }
        }
        easy.follow_location(true).map_err(net)?;
        easy.max_redirections(self.max_redirections).map_err(net)?;
        easy.connect_timeout(self.connect_timeout).map_err(net)?;
        easy.timeout(self.timeout).map_err(net)?;

        let mut list = List::new();
        for (k, v) in request.headers.iter() {
            list.append(&format!("{}: {}", k.trim(), v.trim())).map_err(net)?;
        }
        if request.cache.bypasses_http_cache() && !request.headers.contains("cache-control") {
            list.append("Cache-Control: no-cache").map_err(net)?;
            list.append("Pragma: no-cache").map_err(net)?;
        }
        easy.http_headers(list).map_err(net)?;

        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        let line = s.trim_end();
                        // a new status line starts the next hop of a redirect chain
                        if line.starts_with("HTTP/") {
                            header_lines.clear();
                        }
                        header_lines.push(line.to_string());
                    }
                    true
                })
                .map_err(net)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(net)?;
            transfer.perform().map_err(net)?;
        }

        let code = easy.response_code().map_err(net)?;
        let status = u16::try_from(code)
            .map_err(|_| TransportError::network(url, format!("bad status code {code}")))?;
        let final_url = easy
            .effective_url()
            .ok()
            .flatten()
            .and_then(|u| Url::parse(u).ok());

        tracing::debug!(method = %request.method, url, status, bytes = body.len(), "fetched");

        Ok(Response {
            status,
            headers: parse_header_lines(&header_lines),
            body,
            url: final_url.or_else(|| Some(request.url.clone())),
            kind: ResponseKind::Basic,
        })
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn fetch(&self, request: Request) -> Result<Response, TransportError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.perform(&request))
            .await
            .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

/// Header lines of the final hop into [`Headers`]; status and blank lines are skipped.
pub(crate) fn parse_header_lines(lines: &[String]) -> Headers {
    let mut headers = Headers::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with("HTTP/") {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.append(name.trim(), value.trim());
        }
    }
    headers
}
