//! Minimizer selection.
//!
//! Production builds minimize with two independent minimizers: one for
//! script bundles, which also extracts license comments into a companion
//! file, and one for stylesheets using the `lite` preset. Development builds
//! select nothing, leaving compiled output untouched.

use serde::Serialize;

use crate::mode::BuildMode;

/// Name template for extracted license files.
pub const LICENSE_FILENAME_TEMPLATE: &str = "[file].LICENSE.txt?query=[query]&filebase=[base]";

/// Banner template referencing the license file from the main artifact.
pub const LICENSE_BANNER_TEMPLATE: &str = "License information can be found in [licenseFile]";

/// License comment extraction performed by the script minimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseExtraction {
    /// Extract every license-style comment
    pub condition: bool,
    pub filename: String,
    pub banner: String,
}

impl Default for LicenseExtraction {
    fn default() -> Self {
        Self {
            condition: true,
            filename: LICENSE_FILENAME_TEMPLATE.to_string(),
            banner: LICENSE_BANNER_TEMPLATE.to_string(),
        }
    }
}

impl LicenseExtraction {
    /// License artifact name for an output file.
    ///
    /// `[file]` is the full artifact path, `[base]` its file name and
    /// `[query]` its query string (without `?`). Anything after the first `?`
    /// in the rendered name is a query, not part of the file name.
    pub fn license_file_for(&self, file: &str) -> String {
        let (path, query) = file.split_once('?').unwrap_or((file, ""));
        let base = path.rsplit('/').next().unwrap_or(path);
        let rendered = self
            .filename
            .replace("[file]", path)
            .replace("[query]", query)
            .replace("[base]", base);
        match rendered.split_once('?') {
            Some((name, _)) => name.to_string(),
            None => rendered,
        }
    }

    /// Banner comment placed at the top of the minimized artifact.
    pub fn banner_for(&self, license_file: &str) -> String {
        self.banner.replace("[licenseFile]", license_file)
    }
}

/// Script bundle minimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMinimizer {
    pub tool: String,
    pub extract_comments: LicenseExtraction,
}

/// Stylesheet minimizer preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimizerPreset {
    /// Safe, structure-preserving transforms only
    Lite,
}

/// Stylesheet bundle minimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleMinimizer {
    pub tool: String,
    pub preset: MinimizerPreset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum Minimizer {
    Script(ScriptMinimizer),
    Style(StyleMinimizer),
}

/// Optimization section of the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OptimizationSettings {
    pub minimize: bool,
    #[serde(rename = "minimizer")]
    pub minimizers: Vec<Minimizer>,
}

impl OptimizationSettings {
    pub fn script_minimizer(&self) -> Option<&ScriptMinimizer> {
        self.minimizers.iter().find_map(|m| match m {
            Minimizer::Script(script) => Some(script),
            _ => None,
        })
    }

    pub fn style_minimizer(&self) -> Option<&StyleMinimizer> {
        self.minimizers.iter().find_map(|m| match m {
            Minimizer::Style(style) => Some(style),
            _ => None,
        })
    }
}

/// Select minimizers for the mode.
pub fn select_optimization(mode: BuildMode) -> OptimizationSettings {
    if !mode.is_production() {
        return OptimizationSettings::default();
    }

    tracing::debug!("selecting script and style minimizers");
    OptimizationSettings {
        minimize: true,
        minimizers: vec![
            Minimizer::Script(ScriptMinimizer {
                tool: "terser".to_string(),
                extract_comments: LicenseExtraction::default(),
            }),
            Minimizer::Style(StyleMinimizer {
                tool: "cssnano".to_string(),
                preset: MinimizerPreset::Lite,
            }),
        ],
    }
}
