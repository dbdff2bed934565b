//! Pipeline result types.
//!
//! [`PipelineConfig`] is the declarative configuration handed to the bundler
//! engine. [`CollaboratorReport`] records what the terminal collaborators did
//! once the engine finished.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::build::{CollaboratorBinding, FailurePolicy};
use crate::mode::BuildMode;
use crate::policy::{GlobalStage, OptimizationSettings};
use crate::rules::RuleSet;

/// Output location for emitted bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSettings {
    pub path: PathBuf,
}

/// Module resolution search paths and aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveSettings {
    /// Searched in order
    pub modules: Vec<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub alias: BTreeMap<String, String>,
}

/// Loader resolution search paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderResolveSettings {
    pub modules: Vec<PathBuf>,
}

/// The assembled configuration consumed by the bundler engine.
///
/// Built once per run by the orchestrator and read-only afterwards: fields
/// are crate-private and only exposed through getters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub(crate) mode: BuildMode,
    /// Bundle name to ordered entry paths
    pub(crate) entry: BTreeMap<String, Vec<String>>,
    pub(crate) output: OutputSettings,
    pub(crate) resolve: ResolveSettings,
    pub(crate) resolve_loader: LoaderResolveSettings,
    /// Import name to runtime global
    pub(crate) externals: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) devtool: Option<String>,
    pub(crate) rules: RuleSet,
    pub(crate) stages: Vec<GlobalStage>,
    pub(crate) optimization: OptimizationSettings,
}

impl PipelineConfig {
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn entry(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entry
    }

    pub fn output(&self) -> &OutputSettings {
        &self.output
    }

    pub fn resolve(&self) -> &ResolveSettings {
        &self.resolve
    }

    pub fn resolve_loader(&self) -> &LoaderResolveSettings {
        &self.resolve_loader
    }

    pub fn externals(&self) -> &BTreeMap<String, String> {
        &self.externals
    }

    pub fn devtool(&self) -> Option<&str> {
        self.devtool.as_deref()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Global stages in execution order.
    pub fn stages(&self) -> &[GlobalStage] {
        &self.stages
    }

    pub fn optimization(&self) -> &OptimizationSettings {
        &self.optimization
    }

    pub fn compression_stage_count(&self) -> usize {
        self.stages.iter().filter(|s| s.is_compression()).count()
    }

    /// Whether any rule stage carries a source map option.
    pub fn has_source_maps(&self) -> bool {
        self.rules.iter().flat_map(|r| r.stages()).any(|s| s.has_source_map())
    }

    /// Bindings of the terminal collaborator stages, in run order.
    pub fn collaborator_bindings(&self) -> impl Iterator<Item = &CollaboratorBinding> {
        self.stages.iter().filter_map(|s| match s {
            GlobalStage::Collaborator(binding) => Some(binding),
            _ => None,
        })
    }

    /// Names of the global stages, in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(GlobalStage::name).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Outcome of a single collaborator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorStatus {
    /// Collaborator completed
    Success,
    /// Advisory collaborator failed; the run continued
    Degraded(String),
}

impl CollaboratorStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CollaboratorStatus::Success)
    }
}

impl std::fmt::Display for CollaboratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollaboratorStatus::Success => write!(f, "success"),
            CollaboratorStatus::Degraded(err) => write!(f, "degraded: {}", err),
        }
    }
}

/// Result of running one collaborator.
#[derive(Debug, Clone)]
pub struct CollaboratorRun {
    pub name: String,
    pub failure_policy: FailurePolicy,
    pub status: CollaboratorStatus,
    pub duration: Duration,
}

impl CollaboratorRun {
    pub fn new(
        binding: &CollaboratorBinding,
        status: CollaboratorStatus,
        duration: Duration,
    ) -> Self {
        Self {
            name: binding.name.clone(),
            failure_policy: binding.failure_policy,
            status,
            duration,
        }
    }
}

/// Result of the collaborator phase.
#[derive(Debug, Default)]
pub struct CollaboratorReport {
    pub runs: Vec<CollaboratorRun>,
    pub total_duration: Duration,
}

impl CollaboratorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_run(&mut self, run: CollaboratorRun) {
        self.runs.push(run);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    pub fn success_count(&self) -> usize {
        self.runs.iter().filter(|r| r.status.is_success()).count()
    }

    pub fn degraded_count(&self) -> usize {
        self.runs.iter().filter(|r| matches!(r.status, CollaboratorStatus::Degraded(_))).count()
    }

    /// Whether every collaborator completed without degrading.
    pub fn is_clean(&self) -> bool {
        self.degraded_count() == 0
    }

    /// Names in the order collaborators ran.
    pub fn run_order(&self) -> Vec<&str> {
        self.runs.iter().map(|r| r.name.as_str()).collect()
    }

    /// Format a summary of the collaborator phase.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Collaborators: {} succeeded, {} degraded in {:?}",
            self.success_count(),
            self.degraded_count(),
            self.total_duration
        )];
        for run in self.runs.iter().filter(|r| !r.status.is_success()) {
            lines.push(format!("  - {} ({}): {}", run.name, run.failure_policy, run.status));
        }
        lines.join("\n")
    }
}
