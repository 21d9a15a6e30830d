use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{BuilderError, Result};

pub const PLUGIN_CONFIG_DIR: &str = ".claude-plugin";
pub const PLUGIN_MANIFEST_FILE: &str = "plugin.json";

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_CATEGORY: &str = "productivity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Descriptive metadata stored in `.claude-plugin/plugin.json`. Asset
/// membership is never stored here; it comes from the plugin's directories.
///
/// Fields of an unexpected type fall back to their defaults instead of
/// failing the whole manifest. Only invalid JSON, or a non-object document,
/// is malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default = "default_version", deserialize_with = "lenient_version")]
    pub version: String,
    #[serde(
        default,
        deserialize_with = "lenient_author",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<PluginAuthor>,
    #[serde(default, deserialize_with = "lenient")]
    pub keywords: Vec<String>,
    #[serde(default = "default_category", deserialize_with = "lenient_category")]
    pub category: String,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_version<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(lenient::<_, Option<String>>(deserializer)?.unwrap_or_else(default_version))
}

fn lenient_category<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(lenient::<_, Option<String>>(deserializer)?.unwrap_or_else(default_category))
}

/// `"author": "Name"` and `"author": {"name": ...}` are both in the wild.
fn lenient_author<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<PluginAuthor>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => Some(PluginAuthor::named(name)),
        other => PluginAuthor::deserialize(other).ok(),
    })
}

impl PluginAuthor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            url: None,
        }
    }
}

pub fn manifest_path(plugin_dir: &Path) -> PathBuf {
    plugin_dir.join(PLUGIN_CONFIG_DIR).join(PLUGIN_MANIFEST_FILE)
}

impl PluginManifest {
    /// Manifest for a freshly created plugin.
    pub fn seed(name: &str, description: &str, author: Option<&str>, category: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            description: description.to_string(),
            version: default_version(),
            author: author.map(PluginAuthor::named),
            keywords: Vec::new(),
            category: category.to_string(),
        }
    }

    pub fn load(plugin_dir: &Path) -> Result<Self> {
        let path = manifest_path(plugin_dir);
        let raw = fs::read_to_string(&path).map_err(|err| BuilderError::Malformed {
            path: path.clone(),
            reason: err.to_string(),
        })?;

        serde_json::from_str(&raw).map_err(|err| BuilderError::Malformed {
            path,
            reason: err.to_string(),
        })
    }

    pub fn write(&self, plugin_dir: &Path) -> Result<()> {
        let path = manifest_path(plugin_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }
}
