//! Deep-link recovery through a static host's not-found page.
//!
//! A static host answers `/myapp/tips/lootbar` with its 404 document. That
//! document bounces to the shell with the original route packed into the query
//! (`/myapp/?p=%2Ftips%2Flootbar&q=...&h=...`), and the shell restores the clean
//! address before routing.

use url::form_urlencoded;

use super::{AppPath, RouteMapper};

/// Query string (with leading `?`) the not-found page appends to the shell URL.
pub fn encode_redirect(app_path: &AppPath, search: &str, hash: &str) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());
    ser.append_pair("p", app_path.as_str());
    if !search.is_empty() {
        ser.append_pair("q", search);
    }
    if !hash.is_empty() {
        ser.append_pair("h", hash);
    }
    format!("?{}", ser.finish())
}

/// Clean prefixed address (`/myapp/tips/lootbar?x=1#y`) encoded in a redirect query,
/// or `None` when the query carries no `p` parameter.
pub fn restore_redirected(mapper: &RouteMapper, search: &str) -> Option<String> {
    let query = search.strip_prefix('?').unwrap_or(search);
    let mut path = None;
    let mut q = String::new();
    let mut h = String::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "p" => path = Some(value.into_owned()),
            "q" => q = value.into_owned(),
            "h" => h = value.into_owned(),
            _ => {}
        }
    }
    let path = path.filter(|p| !p.is_empty())?;

    let mut out = mapper.to_location_path(&AppPath::normalize(&path));
    if !q.is_empty() {
        if !q.starts_with('?') {
            out.push('?');
        }
        out.push_str(&q);
    }
    if !h.is_empty() {
        if !h.starts_with('#') {
            out.push('#');
        }
        out.push_str(&h);
    }
    Some(out)
}
