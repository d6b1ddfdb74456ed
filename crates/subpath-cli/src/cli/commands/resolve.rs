//! `subpath resolve` – show the deployment prefix for the page.

use subpath_core::SiteContext;

use super::display_prefix;

pub fn run_resolve(ctx: &SiteContext) {
    let registration = ctx.worker_registration();
    println!("prefix:        {}", display_prefix(ctx.prefix().as_str()));
    println!("source:        {}", ctx.prefix_source().as_str());
    println!("document root: {}", ctx.document_root());
    println!("worker script: {}", registration.script_url);
    println!("worker scope:  {}", registration.scope);
}
