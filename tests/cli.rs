mod common;

use std::fs;

use plugin_builder::cli::{CliContext, Commands, EditAction};
use plugin_builder::model::AssetType;

use common::{Marketplace, reviewer_in_core};

fn context(m: &Marketplace) -> CliContext {
    CliContext::new(m.builder.clone(), false)
}

#[test]
fn dashboard_reports_counts_and_health() {
    let m = reviewer_in_core();
    m.add_leaf(AssetType::Command, "commit", "Write commits");
    let out = context(&m).execute(&Commands::Dashboard).unwrap();

    assert_eq!(out.exit_code, 0);
    assert!(out.text.contains("Marketplace Dashboard"));
    assert!(out.text.contains("Plugins (1)"));
    assert!(out.text.contains("core"));
    assert!(out.text.contains("Orphaned assets: 1"));
    assert!(out.text.contains("commands/commit"));
    assert!(out.text.contains("Symlinks: HEALTHY"));
}

#[test]
fn list_groups_by_type_and_truncates() {
    let m = Marketplace::new();
    let long = "x".repeat(80);
    m.add_leaf(AssetType::Command, "commit", &long);
    m.add_leaf(AssetType::Agent, "planner", "Plans work");

    let cli = context(&m);
    let out = cli.execute(&Commands::List { asset_type: None }).unwrap();
    assert!(out.text.contains("AGENTS:"));
    assert!(out.text.contains("COMMANDS:"));
    assert!(out.text.contains(&format!("commit - {}...", "x".repeat(50))));
    assert!(!out.text.contains(&"x".repeat(51)));

    let only = cli
        .execute(&Commands::List {
            asset_type: Some(AssetType::Agent),
        })
        .unwrap();
    assert!(!only.text.contains("COMMANDS:"));
}

#[test]
fn usage_and_shared_reports() {
    let m = reviewer_in_core();
    m.builder.create_plugin("extras", "").unwrap();
    m.builder
        .add_asset_to_plugin("extras", "reviewer", AssetType::Skill)
        .unwrap();
    let cli = context(&m);

    let usage = cli.execute(&Commands::Usage).unwrap();
    assert!(usage.text.contains("SHARED (2)"));
    assert!(usage.text.contains("core, extras"));

    let shared = cli.execute(&Commands::Duplicates).unwrap();
    assert!(shared.text.contains("Used by: core, extras"));

    let orphans = cli.execute(&Commands::Orphans).unwrap();
    assert_eq!(orphans.text, "No orphaned assets found");
}

#[test]
fn search_output() {
    let m = reviewer_in_core();
    let cli = context(&m);

    let out = cli
        .execute(&Commands::Search {
            query: "review".into(),
        })
        .unwrap();
    assert!(out.text.contains("[skills] reviewer"));
    assert!(out.text.contains("Reviews code"));

    let none = cli
        .execute(&Commands::Search {
            query: "zzz".into(),
        })
        .unwrap();
    assert_eq!(none.text, "No assets found matching 'zzz'");
}

#[test]
fn edit_create_and_delete_flow() {
    let m = Marketplace::new();
    let cli = context(&m);
    let source = m.root().join("commit.md");
    fs::write(&source, "Write commits").unwrap();

    let added = cli
        .execute(&Commands::Add {
            source,
            asset_type: AssetType::Command,
            name: None,
        })
        .unwrap();
    assert_eq!(added.text, "Added to registry: commands/commit");

    let created = cli
        .execute(&Commands::Create {
            name: "core".into(),
            description: "Core".into(),
        })
        .unwrap();
    assert_eq!(created.text, "Created plugin: core");

    let edit = |action| Commands::Edit {
        action,
        plugin: "core".into(),
        asset: "commit".into(),
        asset_type: AssetType::Command,
    };
    let linked = cli.execute(&edit(EditAction::Add)).unwrap();
    assert_eq!(linked.text, "Added command 'commit' to plugin 'core'");
    let again = cli.execute(&edit(EditAction::Add)).unwrap();
    assert!(again.text.starts_with("Asset already exists in plugin:"));

    let guarded = cli.execute(&Commands::Delete {
        name: "commit".into(),
        asset_type: AssetType::Command,
        force: false,
    });
    assert!(guarded.unwrap_err().to_string().contains("--force"));

    let removed = cli.execute(&edit(EditAction::Remove)).unwrap();
    assert_eq!(removed.text, "Removed command 'commit' from plugin 'core'");

    let deleted = cli
        .execute(&Commands::Delete {
            name: "commit".into(),
            asset_type: AssetType::Command,
            force: false,
        })
        .unwrap();
    assert_eq!(deleted.text, "Deleted 'commit' from registry");
}

#[cfg(unix)]
#[test]
fn validate_exit_codes() {
    let m = reviewer_in_core();
    let cli = context(&m);

    let ok = cli.execute(&Commands::Validate).unwrap();
    assert_eq!(ok.exit_code, 0);
    assert_eq!(ok.text, "All plugins validated successfully");

    fs::remove_dir_all(m.root().join("registry/skills/reviewer")).unwrap();
    let broken = cli.execute(&Commands::Validate).unwrap();
    assert_eq!(broken.exit_code, 1);
    assert!(broken.text.contains("BROKEN:"));

    let rebuilt = cli
        .execute(&Commands::Rebuild { plugin: None })
        .unwrap();
    assert!(rebuilt.text.contains("Rebuilding symlinks for: core"));
    assert!(rebuilt.text.contains("Skipped (broken): 1"));
}

#[test]
fn sync_dry_run_and_export() {
    let m = reviewer_in_core();
    let source = m.root().join("incoming");
    fs::create_dir_all(source.join("reviewer")).unwrap();
    fs::write(source.join("planner.md"), "Plans").unwrap();
    let cli = context(&m);

    let preview = cli
        .execute(&Commands::Sync {
            source: source.clone(),
            asset_type: AssetType::Skill,
            dry_run: true,
        })
        .unwrap();
    assert!(preview.text.contains("Would add: planner"));
    assert!(preview.text.contains("Added: 1, Skipped (existing): 1"));
    assert_eq!(m.builder.list_assets(None).unwrap().len(), 1);

    let json = cli.execute(&Commands::Export { output: None }).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json.text).unwrap();
    assert_eq!(value["plugins"][0]["name"], "core");

    let path = m.root().join("out.json");
    let written = cli
        .execute(&Commands::Export {
            output: Some(path.clone()),
        })
        .unwrap();
    assert!(written.text.starts_with("Exported to:"));
    assert!(path.exists());
}

#[test]
fn missing_plugin_is_an_error() {
    let m = Marketplace::new();
    let err = context(&m)
        .execute(&Commands::Rebuild {
            plugin: Some("ghost".into()),
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "Plugin 'ghost' not found");
}
