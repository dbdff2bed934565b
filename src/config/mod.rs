//! Configuration module for assetflow
//!
//! Provides types and parsing for `assetflow.toml` project configuration and
//! the project manifest.

pub mod loader;
pub mod manifest;
pub mod schema;

pub use loader::{default_config, load_config, CliOverrides, ConfigError};
pub use manifest::{load_manifest, ProjectManifest};
pub use schema::*;
