//! `subpath rewrite` – apply the prefix to paths.

use subpath_core::url_model::{classify_url, UrlKind};
use subpath_core::SiteContext;

pub fn run_rewrite(ctx: &SiteContext, paths: &[String], resource: bool) {
    let rewriter = ctx.rewriter();
    for path in paths {
        let out = if resource {
            rewriter.to_resource_url(path)
        } else {
            rewriter.to_navigation_url(path)
        };
        let kind = match classify_url(path) {
            UrlKind::External => "external",
            UrlKind::InternalNavigation => "navigation",
            UrlKind::InternalResource => "resource",
        };
        println!("{:<40} {:<11} {}", path, kind, out);
    }
}
