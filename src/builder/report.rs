use std::fs;
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use super::PluginBuilder;
use crate::error::Result;
use crate::model::{Asset, AssetType, UsageInfo};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total_assets: usize,
    pub commands: usize,
    pub agents: usize,
    pub skills: usize,
    pub plugins: usize,
    pub orphans: usize,
    pub shared: usize,
    pub total_size_kb: u64,
    pub avg_assets_per_plugin: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedAsset {
    pub name: String,
    pub description: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportedRegistry {
    pub commands: Vec<ExportedAsset>,
    pub agents: Vec<ExportedAsset>,
    pub skills: Vec<ExportedAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedPlugin {
    pub name: String,
    pub description: String,
    pub version: String,
    pub commands: Vec<String>,
    pub agents: Vec<String>,
    pub skills: Vec<String>,
}

/// Snapshot of the whole marketplace, written by `export`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub generated_at: String,
    pub stats: Stats,
    pub registry: ExportedRegistry,
    pub plugins: Vec<ExportedPlugin>,
}

impl PluginBuilder {
    /// Registry assets no plugin references, in registry order.
    pub fn orphans(&self) -> Result<Vec<Asset>> {
        let usage = self.usage()?;
        Ok(self
            .list_assets(None)?
            .into_iter()
            .filter(|asset| usage.get(&asset.key()).is_some_and(UsageInfo::is_orphan))
            .collect())
    }

    pub fn shared_assets(&self) -> Result<Vec<UsageInfo>> {
        Ok(self
            .usage()?
            .into_values()
            .filter(UsageInfo::is_shared)
            .collect())
    }

    /// Case-insensitive substring match on name or description.
    pub fn search_assets(&self, query: &str) -> Result<Vec<Asset>> {
        let needle = query.to_lowercase();
        Ok(self
            .list_assets(None)?
            .into_iter()
            .filter(|asset| {
                asset.name.to_lowercase().contains(&needle)
                    || asset.description.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub fn stats(&self) -> Result<Stats> {
        let assets = self.list_assets(None)?;
        let plugins = self.list_plugins()?;
        let usage = self.usage()?;

        let count = |t: AssetType| assets.iter().filter(|a| a.asset_type == t).count();
        let total_bytes: u64 = assets.iter().map(|a| a.size_bytes).sum();
        let linked: usize = plugins.iter().map(|p| p.total_assets()).sum();

        Ok(Stats {
            total_assets: assets.len(),
            commands: count(AssetType::Command),
            agents: count(AssetType::Agent),
            skills: count(AssetType::Skill),
            plugins: plugins.len(),
            orphans: usage.values().filter(|u| u.is_orphan()).count(),
            shared: usage.values().filter(|u| u.is_shared()).count(),
            total_size_kb: total_bytes / 1024,
            avg_assets_per_plugin: if plugins.is_empty() {
                0.0
            } else {
                linked as f64 / plugins.len() as f64
            },
        })
    }

    pub fn export(&self) -> Result<ExportDocument> {
        let mut registry = ExportedRegistry::default();
        for asset in self.list_assets(None)? {
            let bucket = match asset.asset_type {
                AssetType::Command => &mut registry.commands,
                AssetType::Agent => &mut registry.agents,
                AssetType::Skill => &mut registry.skills,
            };
            bucket.push(ExportedAsset {
                name: asset.name,
                description: asset.description,
                size_bytes: asset.size_bytes,
            });
        }

        let plugins = self
            .list_plugins()?
            .into_iter()
            .map(|p| ExportedPlugin {
                name: p.name,
                description: p.description,
                version: p.version,
                commands: p.commands,
                agents: p.agents,
                skills: p.skills,
            })
            .collect();

        Ok(ExportDocument {
            generated_at: Local::now().to_rfc3339(),
            stats: self.stats()?,
            registry,
            plugins,
        })
    }

    /// Pretty JSON export, written to `output` when given.
    pub fn export_json(&self, output: Option<&Path>) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.export()?)?;
        if let Some(path) = output {
            fs::write(path, format!("{json}\n"))?;
            tracing::info!("exported marketplace to {}", path.display());
        }
        Ok(json)
    }
}
