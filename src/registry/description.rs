//! Short descriptions for registry assets.
//!
//! A description comes from the `description:` key of a leading `---`
//! front-matter block, or else from the first line of prose.

use std::fs;
use std::path::Path;

/// Manifest files consulted, in order, for directory assets.
const DIRECTORY_MANIFESTS: [&str; 2] = ["SKILL.md", "README.md"];

const FRONTMATTER_DELIMITER: &str = "---";
const MAX_FALLBACK_CHARS: usize = 100;

/// Describe the asset at `path`. Any read failure yields an empty string.
pub fn describe(path: &Path) -> String {
    match read_source(path) {
        Some(content) => extract(&content),
        None => String::new(),
    }
}

fn read_source(path: &Path) -> Option<String> {
    if path.is_file() {
        return fs::read_to_string(path).ok();
    }

    if path.is_dir() {
        let manifest = DIRECTORY_MANIFESTS
            .iter()
            .map(|name| path.join(name))
            .find(|candidate| candidate.exists())?;
        return fs::read_to_string(manifest).ok();
    }

    None
}

/// Pull a description out of markdown `content`.
pub fn extract(content: &str) -> String {
    let lines: Vec<&str> = content.trim().lines().collect();

    if lines.first() == Some(&FRONTMATTER_DELIMITER) {
        for line in &lines[1..] {
            if *line == FRONTMATTER_DELIMITER {
                break;
            }
            if let Some(value) = line.strip_prefix("description:") {
                return value
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string();
            }
        }
    }

    lines
        .iter()
        .map(|line| line.trim())
        .find(|line| {
            !line.is_empty() && !line.starts_with('#') && !line.starts_with(FRONTMATTER_DELIMITER)
        })
        .map(|line| line.chars().take(MAX_FALLBACK_CHARS).collect())
        .unwrap_or_default()
}
