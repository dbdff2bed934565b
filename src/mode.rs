//! Build mode resolution.
//!
//! The mode is read once from the process environment and threaded through
//! every mode-sensitive component as a plain value.

use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the mode flag.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Flag value that selects a production build. Any other value is development.
pub const PRODUCTION_MARKER: &str = "production";

/// Development vs. production build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Unminified output with source maps
    #[default]
    Development,
    /// Minified, compressed output without source maps
    Production,
}

impl BuildMode {
    /// Map a raw flag value to a mode.
    ///
    /// Only an exact match on [`PRODUCTION_MARKER`] selects production;
    /// absence, empty strings and unknown values all fall back to development.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(PRODUCTION_MARKER) => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }

    pub fn is_development(self) -> bool {
        self == BuildMode::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildMode {
    type Err = String;

    /// Strict parse used for explicit `--mode` arguments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!(
                "unknown build mode '{}' (expected 'development' or 'production')",
                other
            )),
        }
    }
}

/// Resolve the build mode from [`MODE_ENV_VAR`].
///
/// Never fails. Unset or non-unicode values resolve to development.
pub fn resolve_mode() -> BuildMode {
    let flag = env::var(MODE_ENV_VAR).ok();
    let mode = BuildMode::from_flag(flag.as_deref());
    tracing::debug!(flag = ?flag, %mode, "resolved build mode");
    mode
}
