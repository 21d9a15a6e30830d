use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::asset::CONTENT_EXT;
use crate::model::{AssetType, Plugin};
use crate::plugin::manifest::{PluginManifest, manifest_path};
use crate::registry::has_content_ext;

/// Plugin index over `plugins/*`.
#[derive(Debug, Clone)]
pub struct PluginIndex {
    root: PathBuf,
}

impl PluginIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.plugin_dir(name).is_dir()
    }

    /// Every plugin with a readable manifest, sorted by name.
    ///
    /// Directories without a manifest are skipped silently; manifests that
    /// fail to parse are logged and skipped for this scan.
    pub fn list_plugins(&self) -> Result<Vec<Plugin>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut plugins = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let dir = entry?.path();
            if !dir.is_dir() || is_hidden(&dir) || !manifest_path(&dir).exists() {
                continue;
            }

            match load_plugin(&dir) {
                Ok(plugin) => plugins.push(plugin),
                Err(err) => {
                    tracing::warn!("could not load plugin {}: {err}", dir.display());
                }
            }
        }

        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(plugins)
    }
}

fn load_plugin(dir: &Path) -> Result<Plugin> {
    let manifest = PluginManifest::load(dir)?;
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut plugin = Plugin {
        name: manifest.name.unwrap_or(dir_name),
        dir: dir.to_path_buf(),
        description: manifest.description,
        version: manifest.version,
        keywords: manifest.keywords,
        category: manifest.category,
        commands: Vec::new(),
        agents: Vec::new(),
        skills: Vec::new(),
    };

    for asset_type in AssetType::ALL {
        *plugin.assets_mut(asset_type) = list_entries(&dir.join(asset_type.dir_name()))?;
    }

    Ok(plugin)
}

/// Asset names referenced from one plugin type directory, sorted and unique.
pub fn list_entries(type_dir: &Path) -> Result<Vec<String>> {
    if !type_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = BTreeSet::new();
    for entry in fs::read_dir(type_dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        let is_symlink = entry.file_type()?.is_symlink();
        let target = fs::metadata(&path).ok();
        let is_file = target.as_ref().is_some_and(|m| m.is_file());
        let is_dir = target.as_ref().is_some_and(|m| m.is_dir());

        if is_file && has_content_ext(&path) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
        } else if is_dir || is_symlink {
            let name = file_name
                .strip_suffix(&format!(".{CONTENT_EXT}"))
                .unwrap_or(file_name);
            names.insert(name.to_string());
        }
    }

    Ok(names.into_iter().collect())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::manifest::{PLUGIN_CONFIG_DIR, PLUGIN_MANIFEST_FILE};
    use tempfile::tempdir;

    fn write_manifest(plugin_dir: &Path, raw: &str) {
        let config_dir = plugin_dir.join(PLUGIN_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(PLUGIN_MANIFEST_FILE), raw).unwrap();
    }

    #[test]
    fn skips_dirs_without_manifest_and_bad_manifests() {
        let dir = tempdir().unwrap();
        write_manifest(&dir.path().join("zeta"), r#"{"name":"zeta"}"#);
        write_manifest(&dir.path().join("alpha"), r#"{"description":"first"}"#);
        write_manifest(&dir.path().join("broken"), "{");
        fs::create_dir_all(dir.path().join("bare")).unwrap();
        write_manifest(&dir.path().join(".hidden"), r#"{"name":"hidden"}"#);

        let plugins = PluginIndex::new(dir.path()).list_plugins().unwrap();
        let names: Vec<&str> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(plugins[0].description, "first");
        assert_eq!(plugins[0].version, "1.0.0");
    }

    #[test]
    fn entries_are_stemmed_deduplicated_and_sorted() {
        let dir = tempdir().unwrap();
        let commands = dir.path().join("commands");
        fs::create_dir_all(commands.join("tree-cmd")).unwrap();
        fs::write(commands.join("commit.md"), "x").unwrap();
        fs::write(commands.join("bump.md"), "x").unwrap();
        fs::write(commands.join("notes.txt"), "x").unwrap();
        fs::write(commands.join(".hidden.md"), "x").unwrap();

        let names = list_entries(&commands).unwrap();
        assert_eq!(names, vec!["bump", "commit", "tree-cmd"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_still_count_as_membership() {
        let dir = tempdir().unwrap();
        let skills = dir.path().join("skills");
        fs::create_dir_all(&skills).unwrap();
        std::os::unix::fs::symlink("../nowhere.md", skills.join("ghost.md")).unwrap();

        assert_eq!(list_entries(&skills).unwrap(), vec!["ghost"]);
    }

    #[test]
    fn missing_plugins_dir_is_empty() {
        let dir = tempdir().unwrap();
        let index = PluginIndex::new(dir.path().join("plugins"));
        assert!(index.list_plugins().unwrap().is_empty());
    }
}
