//! Source descriptors and the matchers rules use to select them.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

use super::RuleError;

/// A candidate source file as seen by the rule matcher.
///
/// `content` is only populated when some rule carries a content matcher;
/// content matchers never match a descriptor without content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub path: PathBuf,
    pub content: Option<String>,
}

impl SourceDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), content: None }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Path with forward slashes and no leading `./`, the form all matchers see.
    pub fn normalized_path(&self) -> String {
        normalize(&self.path)
    }
}

fn normalize(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    raw.strip_prefix("./").map(str::to_string).unwrap_or(raw)
}

/// Predicate over a [`SourceDescriptor`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SourceMatcher {
    /// Regular expression tested against the normalized path
    Pattern(#[serde(serialize_with = "serialize_regex")] Regex),
    /// Substring of the normalized path
    PathContains(String),
    /// Exact normalized path
    Exact(String),
    /// Regular expression tested against the file content
    Content(#[serde(serialize_with = "serialize_regex")] Regex),
    /// Matches when any inner matcher does
    AnyOf(Vec<SourceMatcher>),
    /// Matches when every inner matcher does
    AllOf(Vec<SourceMatcher>),
}

fn serialize_regex<S: Serializer>(re: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(re.as_str())
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl SourceMatcher {
    /// Path regex matcher.
    pub fn pattern(pattern: &str) -> Result<Self, RuleError> {
        Ok(SourceMatcher::Pattern(compile(pattern)?))
    }

    /// Content regex matcher.
    pub fn content(pattern: &str) -> Result<Self, RuleError> {
        Ok(SourceMatcher::Content(compile(pattern)?))
    }

    pub fn path_contains(fragment: impl Into<String>) -> Self {
        SourceMatcher::PathContains(fragment.into())
    }

    /// Exact path matcher. A leading `./` is ignored.
    pub fn exact(path: impl AsRef<Path>) -> Self {
        SourceMatcher::Exact(normalize(path.as_ref()))
    }

    pub fn matches(&self, source: &SourceDescriptor) -> bool {
        match self {
            SourceMatcher::Pattern(re) => re.is_match(&source.normalized_path()),
            SourceMatcher::PathContains(fragment) => {
                source.normalized_path().contains(fragment.as_str())
            }
            SourceMatcher::Exact(path) => source.normalized_path() == *path,
            SourceMatcher::Content(re) => {
                source.content.as_deref().map(|c| re.is_match(c)).unwrap_or(false)
            }
            SourceMatcher::AnyOf(inner) => inner.iter().any(|m| m.matches(source)),
            SourceMatcher::AllOf(inner) => inner.iter().all(|m| m.matches(source)),
        }
    }

    /// Whether evaluating this matcher needs file content.
    pub fn needs_content(&self) -> bool {
        match self {
            SourceMatcher::Content(_) => true,
            SourceMatcher::AnyOf(inner) | SourceMatcher::AllOf(inner) => {
                inner.iter().any(SourceMatcher::needs_content)
            }
            _ => false,
        }
    }

    /// Short human-readable form used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            SourceMatcher::Pattern(re) => format!("/{}/", re.as_str()),
            SourceMatcher::PathContains(fragment) => format!("*{}*", fragment),
            SourceMatcher::Exact(path) => path.clone(),
            SourceMatcher::Content(re) => format!("content /{}/", re.as_str()),
            SourceMatcher::AnyOf(inner) => {
                inner.iter().map(SourceMatcher::describe).collect::<Vec<_>>().join(" | ")
            }
            SourceMatcher::AllOf(inner) => {
                inner.iter().map(SourceMatcher::describe).collect::<Vec<_>>().join(" & ")
            }
        }
    }
}

impl PartialEq for SourceMatcher {
    fn eq(&self, other: &Self) -> bool {
        use SourceMatcher::*;
        match (self, other) {
            (Pattern(a), Pattern(b)) | (Content(a), Content(b)) => a.as_str() == b.as_str(),
            (PathContains(a), PathContains(b)) | (Exact(a), Exact(b)) => a == b,
            (AnyOf(a), AnyOf(b)) | (AllOf(a), AllOf(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for SourceMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
