//! Source rules and the ordered rule set.

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use super::{RuleError, SourceDescriptor, SourceMatcher, StageKind, TransformStage};

/// Broad class of a source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Script modules (`.js`, `.jsx`)
    Script,
    /// Stylesheet sources (`.css`, `.scss`)
    Style,
    /// Anything else
    Asset,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js") | Some("jsx") => SourceKind::Script,
            Some("css") | Some("scss") => SourceKind::Style,
            _ => SourceKind::Asset,
        }
    }

    /// Script and style sources must be claimed by exactly one rule.
    pub fn requires_rule(self) -> bool {
        !matches!(self, SourceKind::Asset)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Script => write!(f, "script"),
            SourceKind::Style => write!(f, "style"),
            SourceKind::Asset => write!(f, "asset"),
        }
    }
}

/// How one class of sources is transformed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRule {
    name: String,
    kind: SourceKind,
    test: SourceMatcher,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclude: Vec<SourceMatcher>,
    #[serde(rename = "use")]
    stages: Vec<TransformStage>,
}

impl SourceRule {
    pub fn new(name: impl Into<String>, kind: SourceKind, test: SourceMatcher) -> Self {
        Self { name: name.into(), kind, test, exclude: Vec::new(), stages: Vec::new() }
    }

    pub fn exclude(mut self, matcher: SourceMatcher) -> Self {
        self.exclude.push(matcher);
        self
    }

    /// Append a stage. Declaration order is execution-chain order.
    pub fn stage(mut self, stage: TransformStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn pattern(&self) -> &SourceMatcher {
        &self.test
    }

    pub fn exclusions(&self) -> &[SourceMatcher] {
        &self.exclude
    }

    pub fn stages(&self) -> &[TransformStage] {
        &self.stages
    }

    /// Position of the first stage of `kind`, if any.
    pub fn stage_position(&self, kind: StageKind) -> Option<usize> {
        self.stages.iter().position(|s| s.kind() == kind)
    }

    pub fn has_stage(&self, kind: StageKind) -> bool {
        self.stage_position(kind).is_some()
    }

    /// Pattern matches and no exclusion does.
    pub fn matches(&self, source: &SourceDescriptor) -> bool {
        self.test.matches(source) && !self.is_excluded(source)
    }

    pub fn is_excluded(&self, source: &SourceDescriptor) -> bool {
        self.exclude.iter().any(|m| m.matches(source))
    }

    pub fn needs_content(&self) -> bool {
        self.test.needs_content() || self.exclude.iter().any(SourceMatcher::needs_content)
    }

    /// Rebuild this rule with every stage passed through `f`.
    pub(crate) fn map_stages<F>(self, mut f: F) -> Self
    where
        F: FnMut(SourceKind, TransformStage) -> TransformStage,
    {
        let kind = self.kind;
        Self { stages: self.stages.into_iter().map(|s| f(kind, s)).collect(), ..self }
    }
}

/// Ordered rule table.
///
/// Evaluation is a linear scan in declaration order and the first matching,
/// non-excluded rule wins. When two rules both claim a source the earlier one
/// is chosen; this is deliberate, and [`RuleSet::candidates`] exposes the
/// overlap so callers can reject it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<SourceRule>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate rule names.
    pub fn new(rules: Vec<SourceRule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name()) {
                return Err(RuleError::DuplicateRule(rule.name().to_string()));
            }
        }
        Ok(Self { rules })
    }

    /// First declared rule that claims `source`.
    pub fn match_source(&self, source: &SourceDescriptor) -> Option<&SourceRule> {
        self.rules.iter().find(|r| r.matches(source))
    }

    /// Every rule that claims `source`, in declaration order.
    pub fn candidates(&self, source: &SourceDescriptor) -> Vec<&SourceRule> {
        self.rules.iter().filter(|r| r.matches(source)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&SourceRule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn needs_content(&self) -> bool {
        self.rules.iter().any(SourceRule::needs_content)
    }

    /// Rebuild the set with every stage of every rule passed through `f`.
    /// Rule order and names are preserved.
    pub(crate) fn map_stages<F>(self, mut f: F) -> Self
    where
        F: FnMut(SourceKind, TransformStage) -> TransformStage,
    {
        Self { rules: self.rules.into_iter().map(|r| r.map_stages(&mut f)).collect() }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a SourceRule;
    type IntoIter = std::slice::Iter<'a, SourceRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
