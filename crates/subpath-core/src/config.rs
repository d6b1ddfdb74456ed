use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Offline cache worker parameters (`[worker]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Version token embedded in every bucket name (`<version>:<category>`).
    pub version: String,
    /// Naming family shared by every version of this worker; buckets whose
    /// version starts with the family but differs from `version` are swept on activation.
    pub family: String,
    /// Entry document precached next to the scope root (e.g. `index.html`).
    pub shell_document: String,
    /// Activate right after install instead of waiting for open pages to go away.
    pub skip_waiting_on_install: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: "subpath-sw-v1.0.0".to_string(),
            family: "subpath-sw-".to_string(),
            shell_document: "index.html".to_string(),
            skip_waiting_on_install: true,
        }
    }
}

/// Network transport parameters (`[transport]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; the only timeout the worker strategies rely on.
    pub timeout_secs: u64,
    pub max_redirections: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
            max_redirections: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/subpath/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Explicit deployment prefix hint (e.g. "/myapp"). Wins over every
    /// declaration found in the page.
    #[serde(default)]
    pub base: Option<String>,
    /// Site origin (e.g. "https://user.github.io") used when no document URL is given.
    #[serde(default)]
    pub origin: Option<String>,
    /// Root-relative path of the offline cache worker script.
    pub worker_script: String,
    /// Extra app route prefixes on top of the built-in list.
    #[serde(default)]
    pub extra_routes: Vec<String>,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base: None,
            origin: None,
            worker_script: "/sw.js".to_string(),
            extra_routes: Vec::new(),
            worker: WorkerConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("subpath")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SiteConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SiteConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<SiteConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: SiteConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
