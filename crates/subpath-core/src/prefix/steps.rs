//! The ordered resolution steps. Each returns `None` to fall through.

use url::Url;

use super::{DeploymentPrefix, PageEnvironment, PrefixSource};
use crate::url_model::{strip_index_document, trim_trailing_slashes};

/// One resolution step.
pub type PrefixStep = fn(&PageEnvironment) -> Option<DeploymentPrefix>;

/// Resolution order; the first step returning `Some` wins.
pub const STEPS: &[(PrefixSource, PrefixStep)] = &[
    (PrefixSource::Hint, from_prefix_hint),
    (PrefixSource::BaseHref, from_base_href),
    (PrefixSource::EntryScript, from_entry_script),
];

/// Well-known code directory the entry script lives in.
const CODE_DIR: &str = "js";

/// Entry script candidates, most specific first, matched against the resolved script path.
const ENTRY_SCRIPT_HINTS: &[&str] = &["/js/app.core.js", "/js/app.js", "app.js"];

/// Step 1: an explicit, non-empty prefix declaration.
pub fn from_prefix_hint(env: &PageEnvironment) -> Option<DeploymentPrefix> {
    let hint = env.prefix_hint.as_deref()?.trim();
    if hint.is_empty() {
        return None;
    }
    Some(DeploymentPrefix::normalize(hint))
}

/// Step 2: the path of `<base href>`, minus an index document and trailing slashes.
pub fn from_base_href(env: &PageEnvironment) -> Option<DeploymentPrefix> {
    let href = env.base_href.as_deref()?.trim();
    if href.is_empty() {
        return None;
    }
    let url = match env.location.join(href) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!(href, error = %e, "unparseable base href; falling through");
            return None;
        }
    };
    Some(DeploymentPrefix::from_path(strip_index_document(url.path())))
}

/// Step 3: infer from where the entry script is served.
///
/// `/myapp/js/app.js` gives `/myapp`. Without a `/js/` segment the script's own
/// directory is used, minus a trailing `/js`.
pub fn from_entry_script(env: &PageEnvironment) -> Option<DeploymentPrefix> {
    let script = entry_script(env)?;
    let path = strip_index_document(script.path());

    let marker = format!("/{CODE_DIR}/");
    if let Some(idx) = path.rfind(&marker) {
        return Some(DeploymentPrefix::from_path(&path[..idx]));
    }

    let dir = match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    };
    let dir = trim_trailing_slashes(dir);
    let dir = strip_suffix_ignore_case(dir, &format!("/{CODE_DIR}")).unwrap_or(dir);
    Some(DeploymentPrefix::from_path(dir))
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
        Some(&s[..split])
    } else {
        None
    }
}

/// The executing script if known, else the best entry-script candidate, else the last script.
fn entry_script(env: &PageEnvironment) -> Option<Url> {
    if let Some(src) = env.current_script.as_deref().filter(|s| !s.is_empty()) {
        return env.location.join(src).ok();
    }

    let resolved: Vec<Url> = env
        .scripts
        .iter()
        .filter_map(|src| env.location.join(src).ok())
        .collect();

    for hint in ENTRY_SCRIPT_HINTS {
        if let Some(found) = resolved
            .iter()
            .find(|u| u.path().to_ascii_lowercase().ends_with(hint))
        {
            return Some(found.clone());
        }
    }
    resolved.last().cloned()
}
