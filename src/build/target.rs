//! Per-source resolution plan.
//!
//! A plan records, for every discovered source, which rule claimed it and
//! the chain of stages it will pass through. Sources no rule claims pass
//! through untouched (static assets only).

use serde::Serialize;
use std::path::PathBuf;

use crate::rules::{SourceKind, TransformStage};

/// A discovered source and the chain resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSource {
    /// Project-relative source path
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Name of the claiming rule, `None` for pass-through assets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Stages in declared order
    pub stages: Vec<TransformStage>,
}

impl ResolvedSource {
    pub fn claimed(
        path: PathBuf,
        kind: SourceKind,
        rule: impl Into<String>,
        stages: Vec<TransformStage>,
    ) -> Self {
        Self { path, kind, rule: Some(rule.into()), stages }
    }

    pub fn pass_through(path: PathBuf, kind: SourceKind) -> Self {
        Self { path, kind, rule: None, stages: Vec::new() }
    }

    pub fn is_pass_through(&self) -> bool {
        self.rule.is_none()
    }

    /// Chain rendered as `extract(css-loader) -> compile(sass-loader)`.
    pub fn chain_display(&self) -> String {
        if self.stages.is_empty() {
            return "pass-through".to_string();
        }
        self.stages.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
    }
}

impl std::fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rule {
            Some(rule) => {
                write!(f, "{} [{}] {}: {}", self.path.display(), self.kind, rule, self.chain_display())
            }
            None => write!(f, "{} [{}] pass-through", self.path.display(), self.kind),
        }
    }
}

/// Resolution of every discovered source, in discovery order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SourcePlan {
    sources: Vec<ResolvedSource>,
}

impl SourcePlan {
    /// Create a new empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: ResolvedSource) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[ResolvedSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Sources claimed by the named rule.
    pub fn by_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a ResolvedSource> + 'a {
        self.sources.iter().filter(move |s| s.rule.as_deref() == Some(rule))
    }

    pub fn pass_through_count(&self) -> usize {
        self.sources.iter().filter(|s| s.is_pass_through()).count()
    }

    /// Look up a source by project-relative path.
    pub fn get(&self, path: &str) -> Option<&ResolvedSource> {
        self.sources.iter().find(|s| s.path.to_string_lossy().replace('\\', "/") == path)
    }

    /// One line per source followed by a count line.
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self.sources.iter().map(|s| format!("  {}", s)).collect();
        lines.push(format!(
            "{} sources: {} claimed, {} pass-through",
            self.len(),
            self.len() - self.pass_through_count(),
            self.pass_through_count()
        ));
        lines.join("\n")
    }
}
