//! Tests for resolve, rewrite, route and the global options.

use super::{parse, parse_full};
use crate::cli::{document_location, CliCommand, Cli};
use clap::Parser;
use std::path::PathBuf;
use subpath_core::config::SiteConfig;

#[test]
fn cli_parse_resolve() {
    match parse(&["subpath", "resolve"]) {
        CliCommand::Resolve => {}
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_global_options_after_subcommand() {
    let cli = parse_full(&[
        "subpath",
        "resolve",
        "--location",
        "https://user.github.io/myapp/",
        "--html",
        "index.html",
    ]);
    assert_eq!(cli.location.as_deref(), Some("https://user.github.io/myapp/"));
    assert_eq!(cli.html, Some(PathBuf::from("index.html")));
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_rewrite() {
    match parse(&["subpath", "rewrite", "/assets/a.png", "/heroes", "--resource"]) {
        CliCommand::Rewrite { paths, resource } => {
            assert_eq!(paths, vec!["/assets/a.png", "/heroes"]);
            assert!(resource);
        }
        _ => panic!("expected Rewrite"),
    }
}

#[test]
fn cli_parse_rewrite_needs_a_path() {
    assert!(Cli::try_parse_from(["subpath", "rewrite"]).is_err());
}

#[test]
fn cli_parse_route() {
    match parse(&["subpath", "route", "heroes/charlie", "#top"]) {
        CliCommand::Route { hrefs } => assert_eq!(hrefs, vec!["heroes/charlie", "#top"]),
        _ => panic!("expected Route"),
    }
}

#[test]
fn location_defaults_to_configured_origin() {
    let cfg = SiteConfig {
        origin: Some("https://user.github.io/".into()),
        ..SiteConfig::default()
    };
    assert_eq!(
        document_location(&cfg, None).unwrap().as_str(),
        "https://user.github.io/"
    );
    assert_eq!(
        document_location(&cfg, Some("https://h/myapp/x")).unwrap().as_str(),
        "https://h/myapp/x"
    );
    assert!(document_location(&SiteConfig::default(), None).is_err());
    assert!(document_location(&SiteConfig::default(), Some("not a url")).is_err());
}
