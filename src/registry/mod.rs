//! Registry index: discovers assets under `registry/{commands,agents,skills}`.

pub mod description;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use ignore::WalkBuilder;

use crate::error::Result;
use crate::model::asset::CONTENT_EXT;
use crate::model::{Asset, AssetForm, AssetType};

#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn type_dir(&self, asset_type: AssetType) -> PathBuf {
        self.root.join(asset_type.dir_name())
    }

    /// All assets, or only those of `filter`, sorted by `(type, name)`.
    pub fn list_assets(&self, filter: Option<AssetType>) -> Result<Vec<Asset>> {
        let types: Vec<AssetType> = match filter {
            Some(asset_type) => vec![asset_type],
            None => AssetType::ALL.to_vec(),
        };

        let mut assets = Vec::new();
        for asset_type in types {
            let type_dir = self.type_dir(asset_type);
            if !type_dir.is_dir() {
                continue;
            }

            for entry in fs::read_dir(&type_dir)? {
                let path = entry?.path();
                if let Some(asset) = scan_entry(&path, asset_type) {
                    assets.push(asset);
                }
            }
        }

        // Directory form sorts first so it wins over a same-named leaf, as in `find_asset`.
        let is_leaf = |asset: &Asset| asset.form == AssetForm::LeafFile;
        assets.sort_by(|a, b| {
            (a.asset_type.dir_name(), &a.name, is_leaf(a))
                .cmp(&(b.asset_type.dir_name(), &b.name, is_leaf(b)))
        });
        assets.dedup_by(|next, kept| next.asset_type == kept.asset_type && next.name == kept.name);
        Ok(assets)
    }

    /// Locate an asset on disk: directory form first, then `<name>.md`.
    pub fn find_asset(&self, asset_type: AssetType, name: &str) -> Option<PathBuf> {
        let type_dir = self.type_dir(asset_type);
        let bare = type_dir.join(name);
        if bare.exists() {
            return Some(bare);
        }

        let leaf = type_dir.join(format!("{name}.{CONTENT_EXT}"));
        leaf.exists().then_some(leaf)
    }
}

/// Name and form an entry would have as an asset, or `None` if it is hidden
/// or neither a content file nor a directory.
pub fn asset_name(path: &Path) -> Option<(String, AssetForm)> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.starts_with('.') {
        return None;
    }

    let metadata = fs::metadata(path).ok()?;
    if metadata.is_file() && has_content_ext(path) {
        let stem = path.file_stem()?.to_str()?;
        Some((stem.to_string(), AssetForm::LeafFile))
    } else if metadata.is_dir() {
        Some((file_name.to_string(), AssetForm::DirectoryTree))
    } else {
        None
    }
}

/// Build an [`Asset`] for one registry entry.
pub fn scan_entry(path: &Path, asset_type: AssetType) -> Option<Asset> {
    let (name, form) = asset_name(path)?;
    let metadata = fs::metadata(path).ok()?;

    let size_bytes = match form {
        AssetForm::LeafFile => metadata.len(),
        AssetForm::DirectoryTree => tree_size(path),
    };
    let modified = metadata.modified().ok().map(DateTime::<Local>::from);

    Some(Asset {
        name,
        asset_type,
        form,
        path: path.to_path_buf(),
        description: description::describe(path),
        size_bytes,
        modified,
    })
}

pub(crate) fn has_content_ext(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(CONTENT_EXT)
}

fn tree_size(dir: &Path) -> u64 {
    WalkBuilder::new(dir)
        .standard_filters(false)
        .build()
        .flatten()
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            metadata.is_file().then(|| metadata.len())
        })
        .sum()
}
