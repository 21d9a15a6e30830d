use super::asset::AssetType;

/// Which plugins reference one registry asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageInfo {
    pub asset_name: String,
    pub asset_type: AssetType,
    pub plugins: Vec<String>,
}

impl UsageInfo {
    pub fn new(asset_name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            asset_name: asset_name.into(),
            asset_type,
            plugins: Vec::new(),
        }
    }

    pub fn usage_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_orphan(&self) -> bool {
        self.usage_count() == 0
    }

    pub fn is_shared(&self) -> bool {
        self.usage_count() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orphan_and_shared_are_exclusive() {
        let mut info = UsageInfo::new("commit", AssetType::Command);
        assert!(info.is_orphan());
        assert!(!info.is_shared());

        info.plugins.push("core".into());
        assert!(!info.is_orphan());
        assert!(!info.is_shared());

        info.plugins.push("extras".into());
        assert!(!info.is_orphan());
        assert!(info.is_shared());
        assert_eq!(info.usage_count(), 2);
    }
}
