//! Registry and plugin builder for Claude Code marketplaces.
//!
//! Assets (commands, agents, skills) live once under `registry/`; plugins
//! under `plugins/` reference them through relative symlinks.

pub mod app;
pub mod builder;
pub mod cli;
pub mod error;
pub mod logging;
pub mod model;
pub mod msg;
pub mod plugin;
pub mod registry;

pub use builder::PluginBuilder;
pub use error::{BuilderError, Result};
