//! Configuration schema types for `assetflow.toml`
//!
//! Every section has defaults, so an absent file describes the standard
//! project layout: one `index` bundle from `src/index.js`, SCSS styles with a
//! vendor stylesheet special case, and two static files copied verbatim.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Project layout section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project manifest supplying the project name
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Source directory scanned for sources
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Build output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Glob patterns, relative to `src`, used for source discovery
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            src: default_src(),
            out: default_out(),
            sources: default_sources(),
        }
    }
}

fn default_manifest() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("dist")
}

fn default_sources() -> Vec<String> {
    vec!["**/*".to_string()]
}

fn default_entries() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([("index".to_string(), vec!["./src/index.js".to_string()])])
}

/// Module resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Directories searched for modules, in order. Entries containing a path
    /// separator are resolved against the project root.
    #[serde(default = "default_resolve_modules")]
    pub modules: Vec<String>,
    /// Symbolic module name to real path
    #[serde(default = "default_aliases")]
    pub alias: BTreeMap<String, String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self { modules: default_resolve_modules(), alias: default_aliases() }
    }
}

fn default_resolve_modules() -> Vec<String> {
    vec!["node_modules".to_string(), "src/lib".to_string()]
}

fn default_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "font-awesome".to_string(),
        "font-awesome-sass/assets/stylesheets".to_string(),
    )])
}

fn default_externals() -> BTreeMap<String, String> {
    BTreeMap::from([("cockpit".to_string(), "cockpit".to_string())])
}

/// Script rule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Path pattern selecting script sources
    #[serde(default = "default_script_test")]
    pub test: String,
    /// Path fragments excluded from transpilation
    #[serde(default = "default_script_exclude")]
    pub exclude: Vec<String>,
    /// Transpiler loader
    #[serde(default = "default_script_loader")]
    pub loader: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            test: default_script_test(),
            exclude: default_script_exclude(),
            loader: default_script_loader(),
        }
    }
}

fn default_script_test() -> String {
    r"\.(js|jsx)$".to_string()
}

fn default_script_exclude() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_script_loader() -> String {
    "babel-loader".to_string()
}

/// One search/replace applied to the vendor stylesheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    pub search: String,
    #[serde(default)]
    pub replace: String,
}

/// Vendor stylesheet that needs its asset URLs rewritten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorStyleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// File name of the vendor stylesheet
    #[serde(default = "default_vendor_file")]
    pub file: String,
    /// Replacements applied between extraction and compilation
    #[serde(default = "default_vendor_rewrites")]
    pub rewrite: Vec<RewriteConfig>,
    /// Pattern the vendor stylesheet's content must also match
    #[serde(default)]
    pub content: Option<String>,
}

impl Default for VendorStyleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_vendor_file(),
            rewrite: default_vendor_rewrites(),
            content: None,
        }
    }
}

fn default_vendor_file() -> String {
    "patternfly-4-cockpit.scss".to_string()
}

fn default_vendor_rewrites() -> Vec<RewriteConfig> {
    vec![
        RewriteConfig {
            search: r#"src:url\("patternfly-icons-fake-path/pficon[^}]*"#.to_string(),
            replace: r#"src:url("../base1/fonts/patternfly.woff") format("woff");"#.to_string(),
        },
        RewriteConfig {
            search: r"@font-face[^}]*patternfly-fonts-fake-path[^}]*\}".to_string(),
            replace: String::new(),
        },
    ]
}

/// Stylesheet rule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Path pattern selecting stylesheet sources
    #[serde(default = "default_style_test")]
    pub test: String,
    /// Stylesheet compiler loader
    #[serde(default = "default_style_compiler")]
    pub compiler: String,
    /// Name template for extracted stylesheets
    #[serde(default = "default_extract_filename")]
    pub extract_filename: String,
    /// Vendor stylesheet special case
    #[serde(default)]
    pub vendor: VendorStyleConfig,
    /// Path fragments whose plain `.css` files are dropped
    #[serde(default = "default_discard")]
    pub discard: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            test: default_style_test(),
            compiler: default_style_compiler(),
            extract_filename: default_extract_filename(),
            vendor: VendorStyleConfig::default(),
            discard: default_discard(),
        }
    }
}

fn default_style_test() -> String {
    r"\.s?css$".to_string()
}

fn default_style_compiler() -> String {
    "sass-loader".to_string()
}

fn default_extract_filename() -> String {
    "[name].css".to_string()
}

fn default_discard() -> Vec<String> {
    vec!["@patternfly/react-styles/css/components/Table/".to_string()]
}

/// Files copied verbatim to the output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    #[serde(default = "default_copy_files")]
    pub files: Vec<String>,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self { files: default_copy_files() }
    }
}

fn default_copy_files() -> Vec<String> {
    vec!["./src/index.html".to_string(), "./src/manifest.json".to_string()]
}

/// Production asset compression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Pattern over output artifact names
    #[serde(default = "default_compression_test")]
    pub test: String,
    /// Remove the uncompressed artifact once compressed
    #[serde(default = "default_true")]
    pub delete_original_assets: bool,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            test: default_compression_test(),
            delete_original_assets: true,
            algorithm: default_algorithm(),
        }
    }
}

fn default_compression_test() -> String {
    r"\.(js|html|css)$".to_string()
}

fn default_algorithm() -> String {
    "gzip".to_string()
}

fn default_true() -> bool {
    true
}

/// Lint stage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lint_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub fail_on_warning: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self { enabled: true, extensions: default_lint_extensions(), fail_on_warning: true }
    }
}

fn default_lint_extensions() -> Vec<String> {
    vec!["js".to_string(), "jsx".to_string()]
}

/// Validation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Ambiguous rule matches and advisory collaborator failures become fatal
    #[serde(default)]
    pub strict: bool,
}

/// Translation extraction collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Program and arguments run after the build; empty means nothing to run
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self { enabled: true, command: Vec::new() }
    }
}

/// Remote sync collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Remote host; without one the sync is a no-op
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_sync_program")]
    pub program: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { enabled: true, host: None, program: default_sync_program() }
    }
}

fn default_sync_program() -> String {
    "rsync".to_string()
}

/// Collaborators bound as terminal stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default)]
    pub translations: TranslationsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Complete `assetflow.toml` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub project: ProjectConfig,
    /// Bundle name to ordered entry paths
    #[serde(default = "default_entries")]
    pub entries: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// Import name to runtime global name
    #[serde(default = "default_externals")]
    pub externals: BTreeMap<String, String>,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub styles: StylesConfig,
    #[serde(default)]
    pub copy: CopyConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            entries: default_entries(),
            resolve: ResolveConfig::default(),
            externals: default_externals(),
            scripts: ScriptsConfig::default(),
            styles: StylesConfig::default(),
            copy: CopyConfig::default(),
            compression: CompressionConfig::default(),
            lint: LintConfig::default(),
            validate: ValidateConfig::default(),
            collaborators: CollaboratorsConfig::default(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "styles.vendor.rewrite[0].search")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "assetflow.toml: '{}' {}", self.field, self.message)
    }
}

impl PipelineSettings {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.entries.is_empty() {
            errors.push(ConfigValidationError {
                field: "entries".to_string(),
                message: "must declare at least one bundle".to_string(),
            });
        }
        for (name, paths) in &self.entries {
            if paths.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("entries.{}", name),
                    message: "must list at least one entry path".to_string(),
                });
            }
        }

        let mut check_regex = |field: String, pattern: &str| {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ConfigValidationError {
                    field,
                    message: format!("is not a valid pattern: {}", e),
                });
            }
        };
        check_regex("scripts.test".to_string(), &self.scripts.test);
        check_regex("styles.test".to_string(), &self.styles.test);
        check_regex("compression.test".to_string(), &self.compression.test);
        for (i, rewrite) in self.styles.vendor.rewrite.iter().enumerate() {
            check_regex(format!("styles.vendor.rewrite[{}].search", i), &rewrite.search);
        }
        if let Some(content) = &self.styles.vendor.content {
            check_regex("styles.vendor.content".to_string(), content);
        }

        if self.styles.vendor.enabled && self.styles.vendor.file.is_empty() {
            errors.push(ConfigValidationError {
                field: "styles.vendor.file".to_string(),
                message: "must be a non-empty file name".to_string(),
            });
        }

        if self.styles.extract_filename.is_empty() {
            errors.push(ConfigValidationError {
                field: "styles.extract_filename".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        for (i, file) in self.copy.files.iter().enumerate() {
            if file.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("copy.files[{}]", i),
                    message: "must be a non-empty path".to_string(),
                });
            }
        }

        if self.scripts.loader.is_empty() || self.styles.compiler.is_empty() {
            errors.push(ConfigValidationError {
                field: "loader".to_string(),
                message: "script loader and style compiler must be named".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
