//! Source file discovery for the pipeline.
//!
//! Discovers candidate sources under the project source directory based on
//! the glob patterns from the configuration. Content is captured only when a
//! rule carries a content matcher (`styles.vendor.content`).

use crate::build::BuildContext;
use crate::rules::SourceDescriptor;
use glob::glob;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory never descended into during discovery.
pub const VENDORED_MODULES_DIR: &str = "node_modules";

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    /// IO error during file enumeration
    #[error("IO error during discovery of {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Discover source files matching a glob pattern.
///
/// # Arguments
/// - `base_dir` - Base directory to resolve patterns from
/// - `pattern` - Glob pattern to match
///
/// # Returns
/// Sorted list of matching file paths, excluding anything inside
/// `node_modules`.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths = glob(&pattern_str).map_err(|source| DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && !is_vendored(&path) {
                    files.push(path);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading path during discovery");
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_vendored(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::Normal(name) if name == VENDORED_MODULES_DIR))
}

/// Discover all source files from the configured patterns.
///
/// Returns a deduplicated, sorted list of absolute paths.
pub fn discover_all_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    let src_dir = ctx.src_dir();
    let mut all_files = BTreeSet::new();
    for pattern in &ctx.settings().project.sources {
        all_files.extend(discover_files(&src_dir, pattern)?);
    }
    Ok(all_files.into_iter().collect())
}

/// Discover sources as descriptors with project-relative paths, the form the
/// rule matchers expect.
///
/// File content is only read when `with_content` is set.
pub fn discover_sources(
    ctx: &BuildContext,
    with_content: bool,
) -> Result<Vec<SourceDescriptor>, DiscoveryError> {
    let root = ctx.project_root();
    let files = discover_all_sources(ctx)?;
    tracing::debug!(count = files.len(), src = %ctx.src_dir().display(), "discovered sources");

    files
        .into_iter()
        .map(|path| {
            let relative = path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| path.clone());
            let descriptor = SourceDescriptor::new(relative);
            if !with_content {
                return Ok(descriptor);
            }
            // binary assets have no textual content for content matchers
            match fs::read(&path) {
                Ok(bytes) => Ok(match String::from_utf8(bytes) {
                    Ok(text) => descriptor.with_content(text),
                    Err(_) => descriptor,
                }),
                Err(source) => Err(DiscoveryError::Io { path, source }),
            }
        })
        .collect()
}
