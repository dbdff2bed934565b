//! Build context containing configuration and state for a pipeline run.

use crate::config::loader::{find_config, load_config_file, merge_cli_overrides, project_root};
use crate::config::{
    default_config, load_manifest, CliOverrides, ConfigError, PipelineSettings, ProjectManifest,
};
use std::env;
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a pipeline run.
///
/// The context provides everything the orchestrator reads besides the build
/// mode: settings, the project manifest, and the project root.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded settings
    settings: PipelineSettings,
    /// The project manifest
    manifest: ProjectManifest,
    /// Project root directory (where assetflow.toml is located)
    project_root: PathBuf,
    /// Whether to run in strict mode (ambiguity and advisory failures are errors)
    strict: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(settings: PipelineSettings, manifest: ProjectManifest, project_root: PathBuf) -> Self {
        let strict = settings.validate.strict;
        Self { settings, manifest, project_root, strict }
    }

    /// Locate and load settings and manifest.
    ///
    /// With `config_path` the project root is that file's directory. Without
    /// one, `assetflow.toml` is searched upwards from the working directory;
    /// when none exists the working directory is the root and defaults apply.
    pub fn load(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let config_path = config_path.map(Path::to_path_buf).or_else(find_config);
        let (mut settings, root) = match config_path {
            Some(path) => {
                tracing::debug!(config = %path.display(), "using config");
                let settings = load_config_file(&path)?;
                let root = match project_root(&path) {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => env::current_dir()?,
                };
                (settings, root)
            }
            None => {
                tracing::debug!("no assetflow.toml found, using defaults");
                (default_config(), env::current_dir()?)
            }
        };
        merge_cli_overrides(&mut settings, overrides);

        let manifest = load_manifest(&resolve_against(&root, &settings.project.manifest))?;
        Ok(Self::new(settings, manifest, root))
    }

    /// Get the settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Get the project manifest.
    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.settings.project.src)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.settings.project.out)
    }

    /// Whether strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Set strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        resolve_against(&self.project_root, path)
    }

    /// Module search path entry: bare names (`node_modules`) are looked up
    /// by the engine in every ancestor directory, paths are project-relative.
    pub fn resolve_module_dir(&self, dir: &str) -> PathBuf {
        if dir.contains('/') || dir.contains('\\') {
            self.resolve_path(Path::new(dir))
        } else {
            PathBuf::from(dir)
        }
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
