use std::path::PathBuf;

use super::asset::AssetType;

/// A plugin as derived from its directory: manifest metadata plus the asset
/// names found in its per-type subdirectories.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: String,
    pub dir: PathBuf,
    pub description: String,
    pub version: String,
    pub keywords: Vec<String>,
    pub category: String,
    pub commands: Vec<String>,
    pub agents: Vec<String>,
    pub skills: Vec<String>,
}

impl Plugin {
    pub fn assets(&self, asset_type: AssetType) -> &[String] {
        match asset_type {
            AssetType::Command => &self.commands,
            AssetType::Agent => &self.agents,
            AssetType::Skill => &self.skills,
        }
    }

    pub fn assets_mut(&mut self, asset_type: AssetType) -> &mut Vec<String> {
        match asset_type {
            AssetType::Command => &mut self.commands,
            AssetType::Agent => &mut self.agents,
            AssetType::Skill => &mut self.skills,
        }
    }

    pub fn total_assets(&self) -> usize {
        self.commands.len() + self.agents.len() + self.skills.len()
    }

    /// Directory holding this plugin's entries for `asset_type`.
    pub fn type_dir(&self, asset_type: AssetType) -> PathBuf {
        self.dir.join(asset_type.dir_name())
    }
}
