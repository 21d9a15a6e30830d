use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{PluginBuilder, check_name};
use crate::error::{BuilderError, Result};
use crate::model::asset::{AssetForm, CONTENT_EXT, link_name};
use crate::model::{Asset, AssetType, Plugin};
use crate::plugin::links;
use crate::plugin::manifest::PluginManifest;
use crate::registry::{asset_name, scan_entry};

/// Result of linking an asset into a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(PathBuf),
    /// An entry with the same name was already there; nothing was written.
    AlreadyPresent(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Names added, or that would be added in a dry run.
    pub added: Vec<String>,
    pub skipped: usize,
    pub dry_run: bool,
}

impl PluginBuilder {
    /// Copy `source` into the registry as a new asset.
    ///
    /// The name defaults to the file stem or directory name. File sources are
    /// stored as `<name>.md`.
    pub fn add_to_registry(
        &self,
        source: &Path,
        asset_type: AssetType,
        name: Option<&str>,
    ) -> Result<Asset> {
        if !source.exists() {
            return Err(BuilderError::not_found(
                "Source path",
                source.display().to_string(),
            ));
        }

        let is_file = source.is_file();
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let derived = if is_file {
                    source.file_stem()
                } else {
                    source.file_name()
                };
                derived
                    .map(|n| n.to_string_lossy().to_string())
                    .ok_or_else(|| {
                        BuilderError::not_found("Source path", source.display().to_string())
                    })?
            }
        };
        check_name("Asset", &name)?;

        if self.registry.find_asset(asset_type, &name).is_some() {
            return Err(BuilderError::already_exists(
                "Asset",
                format!("{asset_type}/{name}"),
            ));
        }

        let type_dir = self.registry.type_dir(asset_type);
        fs::create_dir_all(&type_dir)?;

        let target = if is_file {
            type_dir.join(link_name(&name, AssetForm::LeafFile))
        } else {
            type_dir.join(&name)
        };

        if is_file {
            copy_file(source, &target)?;
        } else {
            copy_tree(source, &target)?;
        }

        tracing::info!("added {asset_type}/{name} to registry from {}", source.display());

        scan_entry(&target, asset_type)
            .ok_or_else(|| BuilderError::not_found("Asset", format!("{asset_type}/{name}")))
    }

    /// Create an empty plugin with a seeded manifest.
    pub fn create_plugin(&self, name: &str, description: &str) -> Result<Plugin> {
        check_name("Plugin", name)?;
        let plugin_dir = self.plugins.plugin_dir(name);
        if plugin_dir.exists() {
            return Err(BuilderError::already_exists("Plugin", name));
        }

        fs::create_dir_all(&plugin_dir)?;
        for asset_type in AssetType::ALL {
            fs::create_dir_all(plugin_dir.join(asset_type.dir_name()))?;
        }

        let manifest = PluginManifest::seed(
            name,
            description,
            self.defaults.author.as_deref(),
            &self.defaults.category,
        );
        manifest.write(&plugin_dir)?;

        tracing::info!("created plugin {name}");

        Ok(Plugin {
            name: name.to_string(),
            dir: plugin_dir,
            description: manifest.description,
            version: manifest.version,
            keywords: manifest.keywords,
            category: manifest.category,
            commands: Vec::new(),
            agents: Vec::new(),
            skills: Vec::new(),
        })
    }

    /// Link a registry asset into a plugin.
    pub fn add_asset_to_plugin(
        &self,
        plugin: &str,
        asset: &str,
        asset_type: AssetType,
    ) -> Result<LinkOutcome> {
        let plugin_dir = self.existing_plugin_dir(plugin)?;
        check_name("Asset", asset)?;
        let registry_path = self
            .registry
            .find_asset(asset_type, asset)
            .ok_or_else(|| BuilderError::not_found("Asset", format!("{asset_type}/{asset}")))?;

        let type_dir = plugin_dir.join(asset_type.dir_name());
        fs::create_dir_all(&type_dir)?;

        let entry_name = if registry_path.is_file() {
            registry_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| link_name(asset, AssetForm::LeafFile))
        } else {
            asset.to_string()
        };
        let link = type_dir.join(entry_name);

        if links::entry_exists(&link) {
            tracing::debug!("{} already present in {plugin}", link.display());
            return Ok(LinkOutcome::AlreadyPresent(link));
        }

        links::link_relative(&registry_path, &link)?;
        tracing::info!("linked {asset_type}/{asset} into plugin {plugin}");
        Ok(LinkOutcome::Linked(link))
    }

    /// Remove an asset entry from a plugin, whether link, file or directory.
    pub fn remove_asset_from_plugin(
        &self,
        plugin: &str,
        asset: &str,
        asset_type: AssetType,
    ) -> Result<()> {
        let plugin_dir = self.existing_plugin_dir(plugin)?;
        check_name("Asset", asset)?;
        let type_dir = plugin_dir.join(asset_type.dir_name());

        let entry = [
            type_dir.join(asset),
            type_dir.join(format!("{asset}.{CONTENT_EXT}")),
        ]
        .into_iter()
        .find(|candidate| links::entry_exists(candidate))
        .ok_or_else(|| {
            BuilderError::not_found("Asset", format!("{asset_type}/{asset} in plugin {plugin}"))
        })?;

        links::remove_entry(&entry)?;
        tracing::info!("removed {asset_type}/{asset} from plugin {plugin}");
        Ok(())
    }

    /// Rename a registry asset and repoint every plugin symlink to it.
    ///
    /// Returns the plugins whose links were updated. Literal (non-link)
    /// entries in plugins are left under the old name.
    pub fn rename_asset(
        &self,
        old_name: &str,
        new_name: &str,
        asset_type: AssetType,
    ) -> Result<Vec<String>> {
        check_name("Asset", old_name)?;
        check_name("Asset", new_name)?;
        let old_path = self
            .registry
            .find_asset(asset_type, old_name)
            .ok_or_else(|| {
                BuilderError::not_found("Asset", format!("{asset_type}/{old_name}"))
            })?;

        let form = if old_path.is_file() {
            AssetForm::LeafFile
        } else {
            AssetForm::DirectoryTree
        };
        let new_entry = link_name(new_name, form);
        let new_path = self.registry.type_dir(asset_type).join(&new_entry);

        if links::entry_exists(&new_path)
            || self.registry.find_asset(asset_type, new_name).is_some()
        {
            return Err(BuilderError::already_exists(
                "Asset",
                format!("{asset_type}/{new_name}"),
            ));
        }

        let old_canonical = fs::canonicalize(&old_path)?;
        fs::rename(&old_path, &new_path)?;
        tracing::info!("renamed {asset_type}/{old_name} to {new_name}");

        let mut updated = Vec::new();
        for plugin in self.list_plugins()? {
            let type_dir = plugin.type_dir(asset_type);
            for link in links::symlinks_in(&type_dir)? {
                if links::link_target(&link).ok().as_ref() != Some(&old_canonical) {
                    continue;
                }

                fs::remove_file(&link)?;
                let new_link = type_dir.join(&new_entry);
                // Several aliases of the old asset collapse into one link.
                if !links::entry_exists(&new_link) {
                    links::link_relative(&new_path, &new_link)?;
                }
                tracing::info!("updated link in plugin {}", plugin.name);
                if !updated.contains(&plugin.name) {
                    updated.push(plugin.name.clone());
                }
            }
        }

        Ok(updated)
    }

    /// Delete a registry asset and every plugin symlink resolving to it.
    ///
    /// Refuses with [`BuilderError::InUse`] while plugins reference the asset
    /// unless `force` is set. Returns the plugins whose links were removed.
    pub fn delete_asset(
        &self,
        name: &str,
        asset_type: AssetType,
        force: bool,
    ) -> Result<Vec<String>> {
        check_name("Asset", name)?;
        let usage = self.usage()?;
        if let Some(info) = usage.get(&asset_type.key(name)) {
            if !info.plugins.is_empty() && !force {
                return Err(BuilderError::InUse {
                    name: name.to_string(),
                    plugins: info.plugins.clone(),
                });
            }
        }

        let asset_path = self
            .registry
            .find_asset(asset_type, name)
            .ok_or_else(|| BuilderError::not_found("Asset", format!("{asset_type}/{name}")))?;
        let canonical = fs::canonicalize(&asset_path)?;

        let mut unlinked = Vec::new();
        for plugin in self.list_plugins()? {
            for link in links::symlinks_in(&plugin.type_dir(asset_type))? {
                if links::resolve(&link).as_ref() == Some(&canonical) {
                    fs::remove_file(&link)?;
                    tracing::info!("removed link from plugin {}", plugin.name);
                    if !unlinked.contains(&plugin.name) {
                        unlinked.push(plugin.name.clone());
                    }
                }
            }
        }

        links::remove_entry(&asset_path)?;
        tracing::info!("deleted {asset_type}/{name} from registry");
        Ok(unlinked)
    }

    /// Import every new top-level asset found in `source`.
    pub fn sync_from_directory(
        &self,
        source: &Path,
        asset_type: AssetType,
        dry_run: bool,
    ) -> Result<SyncReport> {
        if !source.is_dir() {
            return Err(BuilderError::not_found(
                "Source directory",
                source.display().to_string(),
            ));
        }

        let mut existing: HashSet<String> = self
            .list_assets(Some(asset_type))?
            .into_iter()
            .map(|asset| asset.name)
            .collect();

        let mut entries: Vec<PathBuf> = fs::read_dir(source)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<_>>()?;
        entries.sort();

        let mut report = SyncReport {
            dry_run,
            ..SyncReport::default()
        };

        for path in entries {
            let Some((name, _)) = asset_name(&path) else {
                continue;
            };

            if !existing.insert(name.clone()) {
                report.skipped += 1;
                continue;
            }

            if !dry_run {
                self.add_to_registry(&path, asset_type, Some(&name))?;
            }
            report.added.push(name);
        }

        tracing::info!(
            "sync from {}: {} added, {} skipped (dry run: {dry_run})",
            source.display(),
            report.added.len(),
            report.skipped
        );
        Ok(report)
    }

    fn existing_plugin_dir(&self, plugin: &str) -> Result<PathBuf> {
        check_name("Plugin", plugin)?;
        if !self.plugins.exists(plugin) {
            return Err(BuilderError::not_found("Plugin", plugin));
        }
        Ok(self.plugins.plugin_dir(plugin))
    }
}

/// Copy a file, carrying over its modification time when possible.
fn copy_file(source: &Path, target: &Path) -> io::Result<()> {
    fs::copy(source, target)?;
    if let Ok(modified) = fs::metadata(source).and_then(|m| m.modified()) {
        if let Err(err) = fs::File::options()
            .write(true)
            .open(target)
            .and_then(|file| file.set_modified(modified))
        {
            tracing::debug!("could not preserve mtime on {}: {err}", target.display());
        }
    }
    Ok(())
}

/// Recursively copy `source` to `target`, recreating symlinks as symlinks.
fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir(target)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            copy_link(&from, &to)?;
        } else if file_type.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            copy_file(&from, &to)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_link(from: &Path, to: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_link(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}
