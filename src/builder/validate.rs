use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use super::PluginBuilder;
use crate::error::{BuilderError, Result};
use crate::model::AssetType;
use crate::plugin::links;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// The link target does not exist.
    Broken,
    /// The link resolves, but outside the registry.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub plugin: String,
    pub asset_type: AssetType,
    pub link: PathBuf,
    pub target: Option<PathBuf>,
}

impl ValidationIssue {
    pub fn entry_name(&self) -> String {
        self.link
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub all_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn broken(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.kind == IssueKind::Broken)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.kind == IssueKind::Warning)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub plugins: Vec<String>,
    pub relinked: usize,
    pub skipped: usize,
}

impl PluginBuilder {
    /// Check every plugin symlink. Regular files and directories in plugins
    /// are not inspected.
    pub fn validate(&self) -> Result<ValidationReport> {
        let registry_root = fs::canonicalize(self.registry.root()).ok();
        let mut issues = Vec::new();

        for plugin in self.list_plugins()? {
            for asset_type in AssetType::ALL {
                for link in links::symlinks_in(&plugin.type_dir(asset_type))? {
                    let issue = match links::resolve(&link) {
                        None => Some((IssueKind::Broken, links::link_target(&link).ok())),
                        Some(target) => {
                            let inside = registry_root
                                .as_ref()
                                .is_some_and(|root| target.starts_with(root));
                            (!inside).then_some((IssueKind::Warning, Some(target)))
                        }
                    };

                    if let Some((kind, target)) = issue {
                        tracing::debug!("{kind:?} link {}", link.display());
                        issues.push(ValidationIssue {
                            kind,
                            plugin: plugin.name.clone(),
                            asset_type,
                            link,
                            target,
                        });
                    }
                }
            }
        }

        let all_valid = !issues.iter().any(|i| i.kind == IssueKind::Broken);
        tracing::info!("validated links: {} issues", issues.len());
        Ok(ValidationReport { all_valid, issues })
    }

    /// Recreate resolvable symlinks with freshly computed relative paths,
    /// for one plugin or all of them. Dangling links are left alone.
    pub fn rebuild_symlinks(&self, plugin: Option<&str>) -> Result<RebuildReport> {
        let all = self.list_plugins()?;
        let selected: Vec<_> = match plugin {
            None => all,
            Some(wanted) => {
                let matching: Vec<_> = all
                    .into_iter()
                    .filter(|p| {
                        p.name == wanted
                            || p.dir.file_name().is_some_and(|n| n == wanted)
                    })
                    .collect();
                if matching.is_empty() {
                    return Err(BuilderError::not_found("Plugin", wanted));
                }
                matching
            }
        };

        let mut report = RebuildReport::default();
        for plugin in selected {
            for asset_type in AssetType::ALL {
                for link in links::symlinks_in(&plugin.type_dir(asset_type))? {
                    let Some(target) = links::resolve(&link) else {
                        tracing::warn!("skipping broken link {}", link.display());
                        report.skipped += 1;
                        continue;
                    };

                    fs::remove_file(&link)?;
                    links::link_relative(&target, &link)?;
                    report.relinked += 1;
                }
            }
            tracing::info!("rebuilt links for plugin {}", plugin.name);
            report.plugins.push(plugin.name);
        }

        Ok(report)
    }
}
