//! CLI for inspecting sub-path deployments and their offline caches.

mod commands;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use subpath_core::config::{self, SiteConfig};
use subpath_core::prefix::PageEnvironment;
use subpath_core::SiteContext;
use url::Url;

use commands::{
    run_activate, run_caches, run_fetch, run_install, run_resolve, run_rewrite, run_route,
};

/// Top-level CLI for subpath.
#[derive(Debug, Parser)]
#[command(name = "subpath")]
#[command(about = "subpath: deployment-prefix resolution and offline caching for sub-path hosted apps", long_about = None)]
pub struct Cli {
    /// Document URL the page is loaded from (defaults to the configured origin + "/").
    #[arg(long, global = true, value_name = "URL")]
    pub location: Option<String>,

    /// HTML file of the page, used to read its base href and script tags.
    #[arg(long, global = true, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Use this config file instead of ~/.config/subpath/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the resolved deployment prefix and which step produced it.
    Resolve,

    /// Rewrite root-relative paths for this deployment.
    Rewrite {
        /// Paths or URLs to rewrite.
        #[arg(required = true)]
        paths: Vec<String>,
        /// Treat the inputs as resource loads instead of navigation targets.
        #[arg(long)]
        resource: bool,
    },

    /// Map hrefs to app routes and back to location paths.
    Route {
        #[arg(required = true)]
        hrefs: Vec<String>,
    },

    /// Run one request through the offline worker (network + persistent cache).
    Fetch {
        /// Absolute URL or a path relative to the document location.
        url: String,
        /// Send it as a top-level navigation.
        #[arg(long)]
        navigate: bool,
        /// Accept header value.
        #[arg(long, value_name = "VALUE")]
        accept: Option<String>,
    },

    /// Install the worker: precache the shell into the persistent cache.
    Install,

    /// Activate the worker: sweep buckets left by older versions.
    Activate,

    /// List persisted cache buckets, marking stale ones.
    Caches,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        let ctx = site_context(cfg, cli.location.as_deref(), cli.html.as_ref())?;

        match cli.command {
            CliCommand::Resolve => run_resolve(&ctx),
            CliCommand::Rewrite { paths, resource } => run_rewrite(&ctx, &paths, resource),
            CliCommand::Route { hrefs } => run_route(&ctx, &hrefs),
            CliCommand::Fetch {
                url,
                navigate,
                accept,
            } => run_fetch(&ctx, &url, navigate, accept.as_deref()).await?,
            CliCommand::Install => run_install(&ctx).await?,
            CliCommand::Activate => run_activate(&ctx).await?,
            CliCommand::Caches => run_caches(&ctx).await?,
        }

        Ok(())
    }
}

/// The document URL: `--location`, else the configured origin's root.
fn document_location(cfg: &SiteConfig, location: Option<&str>) -> Result<Url> {
    let raw = match (location, cfg.origin.as_deref()) {
        (Some(loc), _) => loc.to_string(),
        (None, Some(origin)) => format!("{}/", origin.trim_end_matches('/')),
        (None, None) => bail!("no --location given and no `origin` in config"),
    };
    Url::parse(&raw).with_context(|| format!("invalid document location {raw}"))
}

fn site_context(cfg: SiteConfig, location: Option<&str>, html: Option<&PathBuf>) -> Result<SiteContext> {
    let location = document_location(&cfg, location)?;
    let env = match html {
        Some(path) => {
            let page = std::fs::read_to_string(path)
                .with_context(|| format!("reading page {}", path.display()))?;
            PageEnvironment::from_html(location, &page)
        }
        None => PageEnvironment::new(location),
    };
    Ok(SiteContext::from_environment(cfg, env))
}

#[cfg(test)]
mod tests;
