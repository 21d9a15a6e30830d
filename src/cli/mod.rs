//! Command-line interface over [`PluginBuilder`].

pub mod format;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::builder::{LinkOutcome, PluginBuilder};
use crate::error::Result;
use crate::model::AssetType;
use format::Palette;

/// Registry and plugin builder for Claude Code marketplaces
#[derive(Debug, Parser)]
#[command(name = "plugin-builder", version)]
#[command(about = "Manage a registry of commands, agents and skills shared across plugins")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Marketplace root (contains registry/ and plugins/)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (replaces the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EditAction {
    Add,
    Remove,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show registry stats, plugins and health
    #[command(visible_aliases = ["dash", "d"])]
    Dashboard,
    /// List registry assets
    #[command(visible_alias = "ls")]
    List {
        #[arg(short = 't', long = "type")]
        asset_type: Option<AssetType>,
    },
    /// List plugins and their assets
    #[command(visible_alias = "lp")]
    ListPlugins,
    /// Show which plugins use each asset
    #[command(visible_alias = "u")]
    Usage,
    /// Search assets by name or description
    #[command(visible_alias = "s")]
    Search { query: String },
    /// Assets no plugin uses
    Orphans,
    /// Assets used by more than one plugin
    #[command(visible_alias = "shared")]
    Duplicates,
    /// Copy a file or directory into the registry
    Add {
        source: PathBuf,
        #[arg(short = 't', long = "type")]
        asset_type: AssetType,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Create an empty plugin
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Add or remove an asset in a plugin
    Edit {
        action: EditAction,
        plugin: String,
        asset: String,
        #[arg(short = 't', long = "type")]
        asset_type: AssetType,
    },
    /// Rename an asset and update plugin links
    Rename {
        old_name: String,
        new_name: String,
        #[arg(short = 't', long = "type")]
        asset_type: AssetType,
    },
    /// Delete an asset from the registry
    #[command(visible_alias = "rm")]
    Delete {
        name: String,
        #[arg(short = 't', long = "type")]
        asset_type: AssetType,
        /// Delete even when plugins still use it
        #[arg(short, long)]
        force: bool,
    },
    /// Check plugin symlinks; exits 1 when any are broken
    Validate,
    /// Recreate plugin symlinks with fresh relative paths
    Rebuild {
        #[arg(short, long)]
        plugin: Option<String>,
    },
    /// Export the marketplace as JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import new assets from a directory
    Sync {
        source: PathBuf,
        #[arg(short = 't', long = "type")]
        asset_type: AssetType,
        #[arg(long)]
        dry_run: bool,
    },
    /// Open the terminal UI
    #[command(visible_aliases = ["i", "interactive"])]
    Tui,
}

/// Rendered output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code: 0,
        }
    }
}

pub struct CliContext {
    builder: PluginBuilder,
    palette: Palette,
}

impl CliContext {
    pub fn new(builder: PluginBuilder, color: bool) -> Self {
        Self {
            builder,
            palette: Palette::new(color),
        }
    }

    pub fn execute(&self, command: &Commands) -> Result<CommandOutput> {
        tracing::debug!("executing {command:?}");
        let p = &self.palette;
        let b = &self.builder;

        let text = match command {
            Commands::Dashboard => {
                let healthy = b.validate()?.all_valid;
                format::dashboard(
                    p,
                    &b.stats()?,
                    &b.list_plugins()?,
                    &b.orphans()?,
                    &b.shared_assets()?,
                    healthy,
                )
            }
            Commands::List { asset_type } => format::asset_list(p, &b.list_assets(*asset_type)?),
            Commands::ListPlugins => format::plugin_list(p, &b.list_plugins()?),
            Commands::Usage => format::usage_report(p, b.usage()?.values()),
            Commands::Search { query } => {
                format::search_results(p, query, &b.search_assets(query)?)
            }
            Commands::Orphans => format::orphan_list(p, &b.orphans()?),
            Commands::Duplicates => format::shared_list(p, &b.shared_assets()?),
            Commands::Add {
                source,
                asset_type,
                name,
            } => {
                let asset = b.add_to_registry(source, *asset_type, name.as_deref())?;
                p.good(&format!("Added to registry: {}/{}", asset_type, asset.name))
            }
            Commands::Create { name, description } => {
                b.create_plugin(name, description)?;
                p.good(&format!("Created plugin: {name}"))
            }
            Commands::Edit {
                action,
                plugin,
                asset,
                asset_type,
            } => self.edit(*action, plugin, asset, *asset_type)?,
            Commands::Rename {
                old_name,
                new_name,
                asset_type,
            } => {
                let updated = b.rename_asset(old_name, new_name, *asset_type)?;
                let mut out: String = updated
                    .iter()
                    .map(|plugin| format!("  Updated symlink in {plugin}\n"))
                    .collect();
                out.push_str(&p.good(&format!("Renamed '{old_name}' to '{new_name}'")));
                out
            }
            Commands::Delete {
                name,
                asset_type,
                force,
            } => {
                let unlinked = b.delete_asset(name, *asset_type, *force)?;
                let mut out: String = unlinked
                    .iter()
                    .map(|plugin| format!("  Removed symlink from {plugin}\n"))
                    .collect();
                out.push_str(&p.good(&format!("Deleted '{name}' from registry")));
                out
            }
            Commands::Validate => {
                let report = b.validate()?;
                return Ok(CommandOutput {
                    text: format::validation(p, &report),
                    exit_code: if report.all_valid { 0 } else { 1 },
                });
            }
            Commands::Rebuild { plugin } => {
                let report = b.rebuild_symlinks(plugin.as_deref())?;
                let mut out: String = report
                    .plugins
                    .iter()
                    .map(|name| format!("Rebuilding symlinks for: {name}\n"))
                    .collect();
                out.push_str(&p.good(&format!(
                    "Relinked: {}, Skipped (broken): {}",
                    report.relinked, report.skipped
                )));
                out
            }
            Commands::Export { output } => {
                let json = b.export_json(output.as_deref())?;
                match output {
                    Some(path) => p.good(&format!("Exported to: {}", path.display())),
                    None => json,
                }
            }
            Commands::Sync {
                source,
                asset_type,
                dry_run,
            } => {
                let report = b.sync_from_directory(source, *asset_type, *dry_run)?;
                let mut out = String::new();
                if report.dry_run {
                    for name in &report.added {
                        out.push_str(&format!("  Would add: {name}\n"));
                    }
                }
                out.push_str(&p.good(&format!(
                    "Added: {}, Skipped (existing): {}",
                    report.added.len(),
                    report.skipped
                )));
                out
            }
            Commands::Tui => "The terminal UI is started by the plugin-builder binary".to_string(),
        };

        Ok(CommandOutput::ok(text))
    }

    fn edit(
        &self,
        action: EditAction,
        plugin: &str,
        asset: &str,
        asset_type: AssetType,
    ) -> Result<String> {
        let p = &self.palette;
        let kind = asset_type.singular();
        match action {
            EditAction::Add => match self.builder.add_asset_to_plugin(plugin, asset, asset_type)? {
                LinkOutcome::Linked(_) => Ok(p.good(&format!(
                    "Added {kind} '{asset}' to plugin '{plugin}'"
                ))),
                LinkOutcome::AlreadyPresent(path) => Ok(p.warn(&format!(
                    "Asset already exists in plugin: {}",
                    path.display()
                ))),
            },
            EditAction::Remove => {
                self.builder
                    .remove_asset_from_plugin(plugin, asset, asset_type)?;
                Ok(p.good(&format!(
                    "Removed {kind} '{asset}' from plugin '{plugin}'"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_and_types() {
        let cli = Cli::try_parse_from(["plugin-builder", "ls", "-t", "skills"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List {
                asset_type: Some(AssetType::Skill)
            })
        ));

        let cli = Cli::try_parse_from(["plugin-builder", "rm", "commit", "-t", "commands", "-f"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::Delete { force: true, .. })));

        let cli = Cli::try_parse_from(["plugin-builder", "i"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tui)));
    }

    #[test]
    fn no_subcommand_and_globals() {
        let cli = Cli::try_parse_from(["plugin-builder", "--root", "/m", "--no-color"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.root, Some(PathBuf::from("/m")));
        assert!(cli.no_color);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = Cli::try_parse_from(["plugin-builder", "add", "x.md", "-t", "widgets"]);
        assert!(err.is_err());
    }

    #[test]
    fn edit_takes_action() {
        let cli = Cli::try_parse_from([
            "plugin-builder",
            "edit",
            "remove",
            "core",
            "commit",
            "--type",
            "commands",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Edit { action, plugin, .. }) => {
                assert_eq!(action, EditAction::Remove);
                assert_eq!(plugin, "core");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn help_lists_asset_types() {
        use clap::CommandFactory;
        let mut command = Cli::command();
        let help = command
            .find_subcommand_mut("list")
            .unwrap()
            .render_help()
            .to_string();
        assert!(help.contains("commands, agents, skills"));

        let cli = Cli::try_parse_from(["plugin-builder", "ls", "-t", "skill"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List {
                asset_type: Some(AssetType::Skill)
            })
        ));
    }

    #[test]
    fn command_definitions_are_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
