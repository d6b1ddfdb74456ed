//! Lexical helpers for URL paths.

/// Last non-empty segment of a path (`/a/b/file.js` -> `file.js`).
///
/// Returns `None` for the root or an empty path.
pub fn last_segment(path: &str) -> Option<&str> {
    let segment = path.split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}

/// True if the last path segment carries a file extension (`logo.png`, `app.min.js`).
///
/// Dot-files such as `.well-known` do not count.
pub fn last_segment_has_extension(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match last_segment(path) {
        Some(seg) => match seg.rfind('.') {
            Some(idx) => idx > 0 && idx + 1 < seg.len(),
            None => false,
        },
        None => false,
    }
}

/// Strips a trailing `/index.html` or `/index.htm` (case-insensitive).
pub fn strip_index_document(path: &str) -> &str {
    for suffix in ["/index.html", "/index.htm"] {
        if path.len() >= suffix.len() {
            let split = path.len() - suffix.len();
            if path.is_char_boundary(split) && path[split..].eq_ignore_ascii_case(suffix) {
                return &path[..split];
            }
        }
    }
    path
}

/// Strips every trailing `/`.
pub fn trim_trailing_slashes(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Normalizes a raw path to start with `/`, dropping a leading `./`.
pub fn ensure_leading_slash(raw: &str) -> String {
    if raw.starts_with('/') {
        return raw.to_string();
    }
    let rest = raw.strip_prefix("./").unwrap_or(raw);
    format!("/{rest}")
}

/// True if `path` equals `dir` or sits below it (`/heroes`, `/heroes/x` under `/heroes`).
pub fn is_same_or_descendant(path: &str, dir: &str) -> bool {
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
