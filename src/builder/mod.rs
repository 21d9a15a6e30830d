//! Marketplace operations over a registry and a set of plugins.
//!
//! Nothing is cached: every query rescans the filesystem so results always
//! reflect what is on disk.

mod mutate;
mod report;
mod validate;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{BuilderError, Result};
use crate::model::config::PluginDefaults;
use crate::model::{Asset, AssetType, Plugin, UsageInfo};
use crate::plugin::PluginIndex;
use crate::plugin::manifest::DEFAULT_CATEGORY;
use crate::registry::Registry;

pub use mutate::{LinkOutcome, SyncReport};
pub use report::{ExportDocument, ExportedAsset, ExportedPlugin, ExportedRegistry, Stats};
pub use validate::{IssueKind, RebuildReport, ValidationIssue, ValidationReport};

/// Values written into manifests of newly created plugins.
#[derive(Debug, Clone)]
pub struct ManifestDefaults {
    pub author: Option<String>,
    pub category: String,
}

impl Default for ManifestDefaults {
    fn default() -> Self {
        Self {
            author: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl From<&PluginDefaults> for ManifestDefaults {
    fn from(config: &PluginDefaults) -> Self {
        let author = config.author.trim();
        Self {
            author: (!author.is_empty()).then(|| author.to_string()),
            category: config.default_category.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PluginBuilder {
    root: PathBuf,
    registry: Registry,
    plugins: PluginIndex,
    defaults: ManifestDefaults,
}

impl PluginBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            registry: Registry::new(root.join("registry")),
            plugins: PluginIndex::new(root.join("plugins")),
            root,
            defaults: ManifestDefaults::default(),
        }
    }

    pub fn with_manifest_defaults(mut self, defaults: ManifestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn list_assets(&self, asset_type: Option<AssetType>) -> Result<Vec<Asset>> {
        self.registry.list_assets(asset_type)
    }

    pub fn list_plugins(&self) -> Result<Vec<Plugin>> {
        self.plugins.list_plugins()
    }

    /// Usage of every registry asset keyed by `type:name`, including assets
    /// no plugin references. Plugin names appear in plugin order.
    pub fn usage(&self) -> Result<BTreeMap<String, UsageInfo>> {
        let mut usage: BTreeMap<String, UsageInfo> = self
            .list_assets(None)?
            .into_iter()
            .map(|asset| (asset.key(), UsageInfo::new(asset.name, asset.asset_type)))
            .collect();

        for plugin in self.list_plugins()? {
            for asset_type in AssetType::ALL {
                for name in plugin.assets(asset_type) {
                    if let Some(info) = usage.get_mut(&asset_type.key(name)) {
                        info.plugins.push(plugin.name.clone());
                    }
                }
            }
        }

        Ok(usage)
    }
}

/// Reject names that would not stay a single entry inside their directory.
pub(crate) fn check_name(what: &'static str, name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(BuilderError::InvalidName {
            what,
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return invalid("cannot be empty");
    }
    if name.contains(['/', '\\']) {
        return invalid("cannot contain path separators");
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => invalid("cannot be a path component like '.' or '..'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_single_entries() {
        for name in ["commit", "code-review", "v1.2", "..hidden-ish"] {
            assert!(check_name("Asset", name).is_ok(), "{name}");
        }
        for name in ["", "  ", ".", "..", "a/b", "../x", "/abs", "a\\b"] {
            assert!(
                matches!(
                    check_name("Asset", name),
                    Err(BuilderError::InvalidName { .. })
                ),
                "{name:?}"
            );
        }
    }
}


#[cfg(test)]
mod usage_tests {
    use super::testing::Fixture;
    use super::*;

    #[test]
    fn usage_covers_orphans_and_ignores_unknown_names() {
        let fx = Fixture::new();
        fx.leaf(AssetType::Command, "commit", "Commit");
        fx.leaf(AssetType::Command, "bump", "Bump");
        fx.plugin("core");
        fx.plugin("extras");
        fx.link("core", AssetType::Command, "commit");
        fx.link("extras", AssetType::Command, "commit");
        std::fs::write(fx.root().join("plugins/core/commands/stray.md"), "x").unwrap();

        let usage = fx.builder.usage().unwrap();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage["commands:commit"].plugins, vec!["core", "extras"]);
        assert!(usage["commands:bump"].is_orphan());
        assert!(!usage.contains_key("commands:stray"));
    }

    #[test]
    fn usage_is_scoped_by_type() {
        let fx = Fixture::new();
        fx.leaf(AssetType::Command, "review", "cmd");
        fx.tree(AssetType::Skill, "review", "skill");
        fx.plugin("core");
        fx.link("core", AssetType::Skill, "review");

        let usage = fx.builder.usage().unwrap();
        assert!(usage["commands:review"].is_orphan());
        assert_eq!(usage["skills:review"].plugins, vec!["core"]);
    }

    #[test]
    fn manifest_defaults_from_config() {
        let config = PluginDefaults {
            author: "  ".into(),
            default_category: "devtools".into(),
        };
        let defaults = ManifestDefaults::from(&config);
        assert!(defaults.author.is_none());
        assert_eq!(defaults.category, "devtools");
    }
}
