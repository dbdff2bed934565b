//! Mode-dependent stage insertion.
//!
//! Production prepends asset compression and switches sass compilers to
//! compressed output; development threads source maps into every stage that
//! can emit them. Nothing else in the crate branches on stage presence.

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use super::PolicyError;
use crate::build::CollaboratorBinding;
use crate::config::{CompressionConfig, LintConfig};
use crate::mode::BuildMode;
use crate::rules::{RuleSet, SourceKind, StageKind, TransformStage, SOURCE_MAP_OPTION};

/// Devtool emitted for development builds.
pub const DEVELOPMENT_DEVTOOL: &str = "source-map";

/// Compression of finished artifacts. Compressed files replace originals
/// when `delete_original_assets` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStage {
    pub test: String,
    pub delete_original_assets: bool,
    pub algorithm: String,
}

impl From<&CompressionConfig> for CompressionStage {
    fn from(config: &CompressionConfig) -> Self {
        Self {
            test: config.test.clone(),
            delete_original_assets: config.delete_original_assets,
            algorithm: config.algorithm.clone(),
        }
    }
}

/// Verbatim copy of static files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStage {
    pub patterns: Vec<String>,
}

/// Extraction of stylesheet output into standalone files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractStylesStage {
    pub filename: String,
}

/// Lint pass over script sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintStage {
    pub extensions: Vec<String>,
    pub fail_on_warning: bool,
}

impl From<&LintConfig> for LintStage {
    fn from(config: &LintConfig) -> Self {
        Self { extensions: config.extensions.clone(), fail_on_warning: config.fail_on_warning }
    }
}

/// Build-wide stage, applied outside per-source chains.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum GlobalStage {
    Compress(CompressionStage),
    Copy(CopyStage),
    ExtractStyles(ExtractStylesStage),
    Lint(LintStage),
    /// External collaborator, run after all file-level work
    Collaborator(CollaboratorBinding),
}

impl GlobalStage {
    pub fn name(&self) -> &str {
        match self {
            GlobalStage::Compress(_) => "compress",
            GlobalStage::Copy(_) => "copy",
            GlobalStage::ExtractStyles(_) => "extract-styles",
            GlobalStage::Lint(_) => "lint",
            GlobalStage::Collaborator(binding) => &binding.name,
        }
    }

    pub fn is_compression(&self) -> bool {
        matches!(self, GlobalStage::Compress(_))
    }
}

/// Applies the mode's stage additions to rules and global stages.
#[derive(Debug, Clone)]
pub struct StageInsertionPolicy {
    mode: BuildMode,
    compression: CompressionStage,
}

impl StageInsertionPolicy {
    pub fn new(mode: BuildMode, compression: CompressionStage) -> Self {
        Self { mode, compression }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Devtool for the mode: source maps in development only.
    pub fn devtool(&self) -> Option<String> {
        self.mode.is_development().then(|| DEVELOPMENT_DEVTOOL.to_string())
    }

    /// Augment every rule's chain for the mode.
    ///
    /// Fails when a rule explicitly declares source maps in production.
    pub fn apply_rules(&self, rules: RuleSet) -> Result<RuleSet, PolicyError> {
        match self.mode {
            BuildMode::Production => {
                for rule in &rules {
                    if let Some(stage) = rule.stages().iter().find(|s| declares_source_map(s)) {
                        return Err(PolicyError::Conflict {
                            stage: format!("{}/{}", rule.name(), stage),
                            message: "declares source maps, which production builds omit"
                                .to_string(),
                        });
                    }
                }
                tracing::debug!("compressing stylesheet compiler output");
                Ok(rules.map_stages(|kind, stage| {
                    if kind == SourceKind::Style
                        && stage.kind() == StageKind::Compile
                        && is_sass_compiler(stage.loader())
                    {
                        stage.with_nested_option("sassOptions", "outputStyle", json!("compressed"))
                    } else {
                        stage
                    }
                }))
            }
            BuildMode::Development => {
                tracing::debug!("enabling source maps on extract and compile stages");
                Ok(rules.map_stages(|_, stage| {
                    if stage.accepts_source_map() && !stage.has_source_map() {
                        stage.with_option(SOURCE_MAP_OPTION, Value::Bool(true))
                    } else {
                        stage
                    }
                }))
            }
        }
    }

    /// Augment the global stage list for the mode.
    ///
    /// Compression belongs to the policy; a base list that already carries
    /// one is rejected rather than deduplicated.
    pub fn apply_stages(&self, base: Vec<GlobalStage>) -> Result<Vec<GlobalStage>, PolicyError> {
        if base.iter().any(GlobalStage::is_compression) {
            return Err(PolicyError::Conflict {
                stage: "compress".to_string(),
                message: "compression is inserted by the build mode and cannot be declared"
                    .to_string(),
            });
        }

        let mut stages = base;
        if self.mode.is_production() {
            tracing::debug!(test = %self.compression.test, "prepending compression stage");
            stages.insert(0, GlobalStage::Compress(self.compression.clone()));
        }
        Ok(stages)
    }

    /// Check that compression, when active, applies to at least one of the
    /// artifacts the build can produce.
    pub fn check_compression(&self, artifacts: &[String]) -> Result<(), PolicyError> {
        if !self.mode.is_production() {
            return Ok(());
        }
        let test = Regex::new(&self.compression.test).map_err(|e| PolicyError::Conflict {
            stage: "compress".to_string(),
            message: format!("invalid test pattern: {}", e),
        })?;
        if artifacts.iter().any(|a| test.is_match(a)) {
            Ok(())
        } else {
            Err(PolicyError::Conflict {
                stage: "compress".to_string(),
                message: format!(
                    "pattern /{}/ matches none of the build outputs ({})",
                    self.compression.test,
                    artifacts.join(", ")
                ),
            })
        }
    }
}

/// `sassOptions` is only understood by sass loaders.
fn is_sass_compiler(loader: &str) -> bool {
    loader.contains("sass")
}

fn declares_source_map(stage: &TransformStage) -> bool {
    match stage.option(SOURCE_MAP_OPTION) {
        Some(Value::Bool(enabled)) => *enabled,
        Some(_) => true,
        None => false,
    }
}
