//! Normalization of hand-authored external links.

use super::is_external;

/// Adds `https://` to hrefs that name a host but forgot the scheme
/// (`www.example.com`, `example.com/path`).
///
/// Fragments, anything already external, and internal paths come back unchanged.
pub fn normalize_external_href(raw: &str) -> String {
    let h = raw.trim();
    if h.is_empty() || h.starts_with('#') || is_external(h) {
        return h.to_string();
    }
    if h.starts_with("www.") || looks_like_domain(h) {
        return format!("https://{h}");
    }
    h.to_string()
}

/// `label(.label)+` followed by end, `/`, `?` or `#`.
fn looks_like_domain(h: &str) -> bool {
    let host = h.split(['/', '?', '#']).next().unwrap_or("");
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
