use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub plugin: PluginDefaults,
    pub ui: UiConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Marketplace root; empty means the current directory.
    pub marketplace_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginDefaults {
    /// Written into new manifests when non-empty.
    pub author: String,
    pub default_category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub color: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub max_results: usize,
    pub min_query_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULTS).unwrap()
    }
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config (or `explicit`).
    /// The user file only needs the keys it changes.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut layered: toml::Table = toml::from_str(DEFAULTS)?;

        let user_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => directories::ProjectDirs::from("", "", "plugin-builder")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .filter(|path| path.exists()),
        };

        if let Some(path) = user_path {
            let user_str = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let user: toml::Table = toml::from_str(&user_str)
                .with_context(|| format!("parsing config {}", path.display()))?;
            merge(&mut layered, user);
        }

        let mut config: AppConfig = toml::Value::Table(layered)
            .try_into()
            .context("invalid configuration")?;

        if config.general.marketplace_root.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.general.marketplace_root = config
                .general
                .marketplace_root
                .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(config)
    }

    /// Marketplace root: `--root` wins, then the config file, then the cwd.
    pub fn marketplace_root(&self, cli_root: Option<&Path>) -> Result<PathBuf> {
        if let Some(root) = cli_root {
            return Ok(root.to_path_buf());
        }
        if !self.general.marketplace_root.is_empty() {
            return Ok(PathBuf::from(&self.general.marketplace_root));
        }
        Ok(std::env::current_dir()?)
    }
}

/// Overlay `user` onto `base`, descending into tables present in both.
fn merge(base: &mut toml::Table, user: toml::Table) {
    for (key, value) in user {
        if let toml::Value::Table(user_table) = value {
            if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                merge(base_table, user_table);
            } else {
                base.insert(key, toml::Value::Table(user_table));
            }
        } else {
            base.insert(key, value);
        }
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
