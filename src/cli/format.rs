//! Text rendering for CLI output.

use comfy_table::Table;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use owo_colors::OwoColorize;

use crate::builder::{IssueKind, Stats, ValidationReport};
use crate::model::{Asset, AssetType, Plugin, UsageInfo};

const LIST_DESCRIPTION_WIDTH: usize = 50;
const HEALTH_PREVIEW: usize = 3;

/// Colour toggle. Tables stay uncoloured so column widths line up.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().underline().to_string())
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().to_string())
    }

    pub fn name(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan().to_string())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }

    pub fn good(&self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow().to_string())
    }

    pub fn bad(&self, text: &str) -> String {
        self.paint(text, |t| t.red().to_string())
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, |t| t.blue().to_string())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

/// First `width` characters of `text`, with `...` when cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width).collect();
        format!("{cut}...")
    }
}

pub fn dashboard(
    p: &Palette,
    stats: &Stats,
    plugins: &[Plugin],
    orphans: &[Asset],
    shared: &[UsageInfo],
    links_healthy: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", p.heading("Marketplace Dashboard")));

    out.push_str(&format!("{}\n", p.bold("Registry")));
    let mut registry = table(vec!["Type", "Count"]);
    registry.add_row(vec!["Commands".to_string(), stats.commands.to_string()]);
    registry.add_row(vec!["Agents".to_string(), stats.agents.to_string()]);
    registry.add_row(vec!["Skills".to_string(), stats.skills.to_string()]);
    registry.add_row(vec![
        "Total".to_string(),
        format!("{} ({} KB)", stats.total_assets, stats.total_size_kb),
    ]);
    out.push_str(&format!("{registry}\n\n"));

    out.push_str(&format!("{}\n", p.bold(&format!("Plugins ({})", plugins.len()))));
    if plugins.is_empty() {
        out.push_str("  No plugins found\n\n");
    } else {
        let mut listing = table(vec!["Plugin", "Assets", "C", "A", "S"]);
        for plugin in plugins {
            listing.add_row(vec![
                plugin.name.clone(),
                plugin.total_assets().to_string(),
                plugin.commands.len().to_string(),
                plugin.agents.len().to_string(),
                plugin.skills.len().to_string(),
            ]);
        }
        out.push_str(&format!("{listing}\n\n"));
    }

    out.push_str(&format!("{}\n", p.bold("Health")));
    let orphan_count = if orphans.is_empty() {
        p.good("0")
    } else {
        p.warn(&orphans.len().to_string())
    };
    out.push_str(&format!("  Orphaned assets: {orphan_count}\n"));
    let orphan_lines: Vec<String> = orphans
        .iter()
        .map(|a| format!("{}/{}", a.asset_type, a.name))
        .collect();
    push_preview(&mut out, &orphan_lines);

    let shared_count = if shared.is_empty() {
        p.dim("0")
    } else {
        p.info(&shared.len().to_string())
    };
    out.push_str(&format!("  Shared assets: {shared_count}\n"));
    let shared_lines: Vec<String> = shared
        .iter()
        .map(|u| format!("{}/{} ({} plugins)", u.asset_type, u.asset_name, u.usage_count()))
        .collect();
    push_preview(&mut out, &shared_lines);

    let status = if links_healthy {
        p.good("HEALTHY")
    } else {
        p.bad("ISSUES FOUND")
    };
    out.push_str(&format!("  Symlinks: {status}\n"));
    out
}

fn push_preview(out: &mut String, lines: &[String]) {
    for line in lines.iter().take(HEALTH_PREVIEW) {
        out.push_str(&format!("    - {line}\n"));
    }
    if lines.len() > HEALTH_PREVIEW {
        out.push_str(&format!(
            "    - ... and {} more\n",
            lines.len() - HEALTH_PREVIEW
        ));
    }
}

pub fn asset_list(p: &Palette, assets: &[Asset]) -> String {
    if assets.is_empty() {
        return "No assets in registry".to_string();
    }

    let mut out = String::new();
    let mut current: Option<AssetType> = None;
    for asset in assets {
        if current != Some(asset.asset_type) {
            current = Some(asset.asset_type);
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!(
                "{}\n{}\n",
                p.bold(&format!("{}:", asset.asset_type.dir_name().to_uppercase())),
                "-".repeat(50)
            ));
        }

        let description = if asset.description.is_empty() {
            String::new()
        } else {
            format!(" - {}", truncate(&asset.description, LIST_DESCRIPTION_WIDTH))
        };
        out.push_str(&format!("  {}{description}\n", p.name(&asset.name)));
    }
    out
}

pub fn plugin_list(p: &Palette, plugins: &[Plugin]) -> String {
    if plugins.is_empty() {
        return "No plugins found".to_string();
    }

    let mut blocks = Vec::new();
    for plugin in plugins {
        let mut block = format!(
            "{}\n{}\n",
            p.bold(&plugin.name),
            "=".repeat(plugin.name.chars().count())
        );
        if !plugin.description.is_empty() {
            block.push_str(&format!("  {}\n", p.dim(&plugin.description)));
        }
        block.push_str(&format!("  Version: {}\n", plugin.version));
        for (label, names) in [
            ("Commands", &plugin.commands),
            ("Agents", &plugin.agents),
            ("Skills", &plugin.skills),
        ] {
            if !names.is_empty() {
                block.push_str(&format!("  {label}: {}\n", p.name(&names.join(", "))));
            }
        }
        blocks.push(block);
    }
    blocks.join("\n")
}

/// Usage status label: `UNUSED`, `SHARED (n)` or `1 plugin`.
pub fn usage_status(info: &UsageInfo) -> String {
    if info.is_orphan() {
        "UNUSED".to_string()
    } else if info.is_shared() {
        format!("SHARED ({})", info.usage_count())
    } else {
        "1 plugin".to_string()
    }
}

pub fn usage_report<'a>(p: &Palette, usage: impl IntoIterator<Item = &'a UsageInfo>) -> String {
    let usage: Vec<&UsageInfo> = usage.into_iter().collect();
    let mut out = String::new();

    for asset_type in AssetType::ALL {
        let mut items: Vec<&UsageInfo> = usage
            .iter()
            .copied()
            .filter(|u| u.asset_type == asset_type)
            .collect();
        items.sort_by(|a, b| {
            b.usage_count()
                .cmp(&a.usage_count())
                .then_with(|| a.asset_name.cmp(&b.asset_name))
        });

        out.push_str(&format!(
            "{}\n",
            p.bold(&format!("{}:", asset_type.dir_name().to_uppercase()))
        ));
        if items.is_empty() {
            out.push_str("  (none)\n\n");
            continue;
        }

        let mut rows = table(vec!["Asset", "Status", "Plugins"]);
        for info in items {
            let plugins = if info.plugins.is_empty() {
                "-".to_string()
            } else {
                info.plugins.join(", ")
            };
            rows.add_row(vec![info.asset_name.clone(), usage_status(info), plugins]);
        }
        out.push_str(&format!("{rows}\n\n"));
    }
    out.trim_end().to_string()
}

pub fn search_results(p: &Palette, query: &str, results: &[Asset]) -> String {
    if results.is_empty() {
        return format!("No assets found matching '{query}'");
    }

    let mut out = format!("{}\n\n", p.bold(&format!("Search results for '{query}':")));
    for asset in results {
        out.push_str(&format!("  [{}] {}\n", asset.asset_type, p.name(&asset.name)));
        if !asset.description.is_empty() {
            out.push_str(&format!("    {}\n", p.dim(&asset.description)));
        }
    }
    out
}

pub fn orphan_list(p: &Palette, orphans: &[Asset]) -> String {
    if orphans.is_empty() {
        return p.good("No orphaned assets found");
    }

    let mut out = format!(
        "{}\n\n",
        p.warn("Orphaned assets (not used by any plugin):")
    );
    for asset in orphans {
        out.push_str(&format!("  [{}] {}\n", asset.asset_type, asset.name));
    }
    out
}

pub fn shared_list(p: &Palette, shared: &[UsageInfo]) -> String {
    if shared.is_empty() {
        return p.dim("No shared assets found");
    }

    let mut sorted: Vec<&UsageInfo> = shared.iter().collect();
    sorted.sort_by(|a, b| b.usage_count().cmp(&a.usage_count()));

    let mut out = format!(
        "{}\n\n",
        p.info("Shared assets (used by multiple plugins):")
    );
    for info in sorted {
        out.push_str(&format!(
            "  [{}] {}\n    Used by: {}\n",
            info.asset_type,
            p.name(&info.asset_name),
            info.plugins.join(", ")
        ));
    }
    out
}

pub fn validation(p: &Palette, report: &ValidationReport) -> String {
    if report.issues.is_empty() {
        return p.good("All plugins validated successfully");
    }

    let mut out = String::from("Issues found:\n");
    for issue in &report.issues {
        let line = match issue.kind {
            IssueKind::Broken => format!("{}: {}", p.bad("BROKEN"), issue.link.display()),
            IssueKind::Warning => format!(
                "{}: Not pointing to registry: {}",
                p.warn("WARNING"),
                issue.link.display()
            ),
        };
        out.push_str(&format!("  {line}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn usage_labels() {
        let mut info = UsageInfo::new("commit", AssetType::Command);
        assert_eq!(usage_status(&info), "UNUSED");
        info.plugins.push("core".into());
        assert_eq!(usage_status(&info), "1 plugin");
        info.plugins.push("extras".into());
        assert_eq!(usage_status(&info), "SHARED (2)");
    }

    #[test]
    fn usage_report_orders_by_count_then_name() {
        let mut shared = UsageInfo::new("zeta", AssetType::Command);
        shared.plugins = vec!["a".into(), "b".into()];
        let unused = UsageInfo::new("alpha", AssetType::Command);
        let mut single = UsageInfo::new("beta", AssetType::Command);
        single.plugins = vec!["a".into()];

        let out = usage_report(&Palette::new(false), [&unused, &single, &shared]);
        let zeta = out.find("zeta").unwrap();
        let beta = out.find("beta").unwrap();
        let alpha = out.find("alpha").unwrap();
        assert!(zeta < beta && beta < alpha);
        assert!(out.contains("AGENTS:"));
    }

    #[test]
    fn plain_palette_adds_no_escapes() {
        let p = Palette::new(false);
        assert_eq!(p.bad("BROKEN"), "BROKEN");
        assert!(Palette::new(true).bad("BROKEN").contains('\u{1b}'));
    }

    #[test]
    fn preview_caps_at_three() {
        let mut out = String::new();
        let lines: Vec<String> = (0..5).map(|i| format!("commands/c{i}")).collect();
        push_preview(&mut out, &lines);
        assert_eq!(out.lines().count(), 4);
        assert!(out.contains("... and 2 more"));
    }
}
