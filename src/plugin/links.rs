//! Relative symbolic links from plugin directories into the registry.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Path to `target` expressed relative to the directory `base`.
///
/// Both paths are made absolute first; symlinks are not resolved, so callers
/// pass paths in the same form they will be joined in.
pub fn relative_path(target: &Path, base: &Path) -> io::Result<PathBuf> {
    let target = normalize(&std::path::absolute(target)?);
    let base = normalize(&std::path::absolute(base)?);

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Ok(relative)
}

/// Lexically fold `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Create `link` pointing at `target` through a relative path.
pub fn link_relative(target: &Path, link: &Path) -> io::Result<()> {
    let parent = link
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "link has no parent"))?;
    let relative = relative_path(&canonical_parent(target), &fs::canonicalize(parent)?)?;
    symlink(&relative, link)
}

/// `path` with its parent directory canonicalized and the final component
/// kept as is, so a target that is itself a link is not followed.
fn canonical_parent(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    let resolved = link.parent().map(|p| p.join(original));
    if resolved.is_some_and(|p| p.is_dir()) {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// True if something (including a dangling link) occupies `path`.
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Canonical target of `link`, or `None` when it does not resolve.
pub fn resolve(link: &Path) -> Option<PathBuf> {
    fs::canonicalize(link).ok()
}

/// Where `link` points, resolved lexically against its canonical parent.
/// Works for dangling links, unlike [`resolve`].
pub fn link_target(link: &Path) -> io::Result<PathBuf> {
    if let Some(target) = resolve(link) {
        return Ok(target);
    }

    let raw = fs::read_link(link)?;
    if raw.is_absolute() {
        return Ok(normalize(&raw));
    }
    let parent = link
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "link has no parent"))?;
    Ok(normalize(&fs::canonicalize(parent)?.join(raw)))
}

/// Symlink entries directly inside `dir`, sorted by file name.
pub fn symlinks_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut links = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_symlink() {
            links.push(entry.path());
        }
    }
    links.sort();
    Ok(links)
}

/// Remove a link, file, or directory tree at `path` without following links.
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_walks_up_and_down() {
        let rel = relative_path(
            Path::new("/m/registry/skills/reviewer"),
            Path::new("/m/plugins/core/skills"),
        )
        .unwrap();
        assert_eq!(rel, PathBuf::from("../../../registry/skills/reviewer"));
    }

    #[test]
    fn relative_path_folds_dot_segments() {
        let rel = relative_path(Path::new("/a/./b/../c"), Path::new("/a")).unwrap();
        assert_eq!(rel, PathBuf::from("c"));
    }

    #[test]
    fn relative_path_to_self_is_dot() {
        let rel = relative_path(Path::new("/a/b"), Path::new("/a/b")).unwrap();
        assert_eq!(rel, PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn link_relative_resolves_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("registry/commands/commit.md");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "x").unwrap();
        let link_dir = dir.path().join("plugins/core/commands");
        fs::create_dir_all(&link_dir).unwrap();
        let link = link_dir.join("commit.md");

        link_relative(&target, &link).unwrap();

        assert!(is_symlink(&link));
        assert!(fs::read_link(&link).unwrap().is_relative());
        let canonical = fs::canonicalize(&target).unwrap();
        assert_eq!(resolve(&link), Some(canonical.clone()));
        assert_eq!(symlinks_in(&link_dir).unwrap(), vec![link.clone()]);

        fs::remove_file(&target).unwrap();
        assert!(resolve(&link).is_none());
        assert_eq!(link_target(&link).unwrap(), canonical);
        assert!(entry_exists(&link));

        remove_entry(&link).unwrap();
        assert!(!entry_exists(&link));
    }
}
