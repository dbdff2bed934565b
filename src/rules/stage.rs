//! Transformation stages.
//!
//! A stage is one loader step inside a rule's chain. Stages are value types:
//! the `with_*` builders consume and return, there is no in-place mutation.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Option key for source map generation.
pub const SOURCE_MAP_OPTION: &str = "sourceMap";

/// Ordered option bag passed to a stage's loader.
pub type StageOptions = BTreeMap<String, Value>;

/// What a stage does to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Marks output for extraction into a standalone stylesheet
    Extract,
    /// Textual search/replace over the source
    Rewrite,
    /// Language compilation (transpiler or stylesheet compiler)
    Compile,
    /// Verbatim copy to the output directory
    Copy,
    /// Drop the source, producing empty output
    Discard,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Extract => write!(f, "extract"),
            StageKind::Rewrite => write!(f, "rewrite"),
            StageKind::Compile => write!(f, "compile"),
            StageKind::Copy => write!(f, "copy"),
            StageKind::Discard => write!(f, "discard"),
        }
    }
}

/// A single search/replace applied by a rewrite stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Regular expression, applied globally
    pub search: String,
    pub replace: String,
}

impl Replacement {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self { search: search.into(), replace: replace.into() }
    }
}

/// One step in a transformation chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformStage {
    kind: StageKind,
    loader: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: StageOptions,
}

impl TransformStage {
    pub fn new(kind: StageKind, loader: impl Into<String>) -> Self {
        Self { kind, loader: loader.into(), options: StageOptions::new() }
    }

    /// Style extraction marker. Url resolution stays off so vendor asset
    /// references survive untouched into the extracted stylesheet.
    pub fn extract() -> Self {
        Self::new(StageKind::Extract, "css-loader").with_option("url", Value::Bool(false))
    }

    pub fn rewrite(replacements: &[Replacement]) -> Self {
        let multiple: Vec<Value> = replacements
            .iter()
            .map(|r| json!({ "search": r.search, "replace": r.replace, "flags": "g" }))
            .collect();
        Self::new(StageKind::Rewrite, "string-replace-loader")
            .with_option("multiple", Value::Array(multiple))
    }

    pub fn compile(loader: impl Into<String>) -> Self {
        Self::new(StageKind::Compile, loader)
    }

    pub fn copy() -> Self {
        Self::new(StageKind::Copy, "copy")
    }

    pub fn discard() -> Self {
        Self::new(StageKind::Discard, "null-loader")
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Merge `value` into a nested object option, creating it if needed.
    pub fn with_nested_option(mut self, key: &str, nested_key: &str, value: Value) -> Self {
        let entry = self.options.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(nested_key.to_string(), value);
        }
        self
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn loader(&self) -> &str {
        &self.loader
    }

    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn has_source_map(&self) -> bool {
        self.options.contains_key(SOURCE_MAP_OPTION)
    }

    /// Extraction and compilation stages can emit source maps.
    pub fn accepts_source_map(&self) -> bool {
        matches!(self.kind, StageKind::Extract | StageKind::Compile)
    }
}

impl std::fmt::Display for TransformStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.loader)
    }
}
