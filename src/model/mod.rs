pub mod asset;
pub mod config;
pub mod mode;
pub mod plugin;
pub mod usage;

pub use asset::{Asset, AssetForm, AssetType};
pub use plugin::Plugin;
pub use usage::UsageInfo;
