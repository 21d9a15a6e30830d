use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Extension of content files in the registry and in plugins.
pub const CONTENT_EXT: &str = "md";

/// Kinds of assets the registry holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum AssetType {
    #[serde(rename = "commands")]
    #[value(name = "commands", alias = "command")]
    Command,
    #[serde(rename = "agents")]
    #[value(name = "agents", alias = "agent")]
    Agent,
    #[serde(rename = "skills")]
    #[value(name = "skills", alias = "skill")]
    Skill,
}

impl AssetType {
    pub const ALL: [AssetType; 3] = [AssetType::Command, AssetType::Agent, AssetType::Skill];

    /// Directory name under `registry/` and under each plugin.
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetType::Command => "commands",
            AssetType::Agent => "agents",
            AssetType::Skill => "skills",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            AssetType::Command => "command",
            AssetType::Agent => "agent",
            AssetType::Skill => "skill",
        }
    }

    /// Key used by the usage map, e.g. `skills:reviewer`.
    pub fn key(self, name: &str) -> String {
        format!("{}:{name}", self.dir_name())
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commands" | "command" => Ok(AssetType::Command),
            "agents" | "agent" => Ok(AssetType::Agent),
            "skills" | "skill" => Ok(AssetType::Skill),
            other => Err(format!(
                "unknown asset type '{other}' (expected commands, agents or skills)"
            )),
        }
    }
}

/// On-disk shape of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetForm {
    /// A single `<name>.md` file.
    LeafFile,
    /// A directory `<name>/` with arbitrary contents.
    DirectoryTree,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub asset_type: AssetType,
    pub form: AssetForm,
    pub path: PathBuf,
    pub description: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

impl Asset {
    pub fn key(&self) -> String {
        self.asset_type.key(&self.name)
    }
}

pub(crate) fn link_name(name: &str, form: AssetForm) -> String {
    match form {
        AssetForm::LeafFile => format!("{name}.{CONTENT_EXT}"),
        AssetForm::DirectoryTree => name.to_string(),
    }
}
