pub mod index;
pub mod links;
pub mod manifest;

pub use index::PluginIndex;
pub use manifest::PluginManifest;
