//! `subpath route` – hrefs to app routes and back.

use subpath_core::SiteContext;

pub fn run_route(ctx: &SiteContext, hrefs: &[String]) {
    let mapper = ctx.routes();
    println!("{:<32} {:<24} {:<6} {}", "HREF", "APP PATH", "KNOWN", "LOCATION");
    for href in hrefs {
        match mapper.app_path_from_href(href, ctx.location()) {
            Some(app) => println!(
                "{:<32} {:<24} {:<6} {}",
                href,
                app.as_str(),
                if mapper.is_known_app_route(&app) { "yes" } else { "no" },
                mapper.to_location_path(&app)
            ),
            None => println!("{:<32} {:<24} {:<6} -", href, "-", "-"),
        }
    }
}
