//! WikiRacer configuration file.
//!
//! Every table and field is optional; anything left out falls back to its
//! default. Command line flags override whatever the file says.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wikiracer_bridge::BridgeConfig;
use wikiracer_core::{EmbedderConfig, NavigatorConfig};
use wikiracer_scanner::ResolverConfig;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/wikiracer/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mirror races to a live browser view unless `--no-demo` is given.
    pub demo: bool,
    pub navigator: NavigatorConfig,
    pub resolver: ResolverConfig,
    pub oracle: EmbedderConfig,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    /// Parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise the default location. A missing
    /// default file means defaults; a missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(&expand_path(&path.to_string_lossy())),
            None => {
                let default = expand_path(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load(&default)
                } else {
                    debug!("No config at {}, using defaults", default.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
