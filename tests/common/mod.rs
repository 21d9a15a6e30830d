#![allow(dead_code)]

use std::fs;
use std::path::Path;

use plugin_builder::PluginBuilder;
use plugin_builder::model::AssetType;
use tempfile::TempDir;

pub struct Marketplace {
    pub dir: TempDir,
    pub builder: PluginBuilder,
}

impl Marketplace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let builder = PluginBuilder::new(dir.path());
        Self { dir, builder }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a source file or skill directory outside the registry and add it.
    pub fn add_leaf(&self, asset_type: AssetType, name: &str, content: &str) {
        let staging = self.root().join("staging");
        fs::create_dir_all(&staging).unwrap();
        let source = staging.join(format!("{name}.md"));
        fs::write(&source, content).unwrap();
        self.builder.add_to_registry(&source, asset_type, None).unwrap();
    }

    pub fn add_tree(&self, asset_type: AssetType, name: &str, manifest: &str) {
        let source = self.root().join("staging").join(name);
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("SKILL.md"), manifest).unwrap();
        self.builder.add_to_registry(&source, asset_type, None).unwrap();
    }

    pub fn asset_keys(&self) -> Vec<String> {
        self.builder
            .list_assets(None)
            .unwrap()
            .into_iter()
            .map(|a| a.key())
            .collect()
    }
}

/// The documented scenario: skill `reviewer` linked into plugin `core`.
pub fn reviewer_in_core() -> Marketplace {
    let m = Marketplace::new();
    m.add_tree(
        AssetType::Skill,
        "reviewer",
        "---\nname: reviewer\ndescription: \"Reviews code\"\n---\n\n# Reviewer\n",
    );
    m.builder.create_plugin("core", "Core tools").unwrap();
    m.builder
        .add_asset_to_plugin("core", "reviewer", AssetType::Skill)
        .unwrap();
    m
}
