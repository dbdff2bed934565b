//! Pipeline orchestration.
//!
//! The orchestrator is the single entry point. It assembles the rule table,
//! applies the mode policies, binds the collaborators and returns the
//! [`PipelineConfig`] handed to the bundler engine. Every check runs during
//! assembly, so a configuration that is returned is one the engine can
//! consume without further validation.

use std::path::Path;
use std::time::Instant;

use crate::build::{
    discover_sources, BuildContext, Collaborator, CollaboratorContext, CollaboratorReport,
    CollaboratorRun, CollaboratorStatus, FailurePolicy, LoaderResolveSettings, OutputSettings,
    PipelineConfig, RemoteSync, ResolveSettings, ResolvedSource, SourcePlan,
    TranslationExtraction,
};
use crate::error::PipelineError;
use crate::mode::{resolve_mode, BuildMode};
use crate::policy::{
    select_optimization, CompressionStage, CopyStage, ExtractStylesStage, GlobalStage, LintStage,
    StageInsertionPolicy,
};
use crate::rules::{
    build_chain, standard_rules, RuleSet, SourceDescriptor, SourceKind, StageKind,
};

/// Assembles pipeline configurations and runs terminal collaborators.
pub struct PipelineOrchestrator {
    /// Build context
    context: BuildContext,
    /// Terminal collaborators, in run order
    collaborators: Vec<Box<dyn Collaborator>>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator with no collaborators.
    pub fn new(context: BuildContext) -> Self {
        Self { context, collaborators: Vec::new() }
    }

    /// Append a collaborator. Collaborators run in the order added.
    pub fn with_collaborator(mut self, collaborator: impl Collaborator + 'static) -> Self {
        self.collaborators.push(Box::new(collaborator));
        self
    }

    /// Add translation extraction and remote sync as enabled in settings.
    pub fn with_standard_collaborators(self) -> Self {
        let collaborators = &self.context.settings().collaborators;
        let translations = collaborators
            .translations
            .enabled
            .then(|| TranslationExtraction::from(&collaborators.translations));
        let sync = collaborators.sync.enabled.then(|| {
            RemoteSync::from_config(&collaborators.sync, self.context.manifest().sync_destination())
        });

        let mut orchestrator = self;
        if let Some(translations) = translations {
            orchestrator = orchestrator.with_collaborator(translations);
        }
        if let Some(sync) = sync {
            orchestrator = orchestrator.with_collaborator(sync);
        }
        orchestrator
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn collaborator_names(&self) -> Vec<&str> {
        self.collaborators.iter().map(|c| c.name()).collect()
    }

    /// Assemble the configuration for `mode`.
    pub fn assemble(&self, mode: BuildMode) -> Result<PipelineConfig, PipelineError> {
        let settings = self.context.settings();
        tracing::info!(%mode, project = %self.context.manifest().name, "assembling pipeline configuration");

        let rules = standard_rules(settings)?;
        self.check_entries(&rules)?;

        let policy = StageInsertionPolicy::new(mode, CompressionStage::from(&settings.compression));
        let rules = policy.apply_rules(rules)?;
        let mut stages = policy.apply_stages(self.base_stages())?;
        policy.check_compression(&self.expected_artifacts(&rules))?;

        let optimization = select_optimization(mode);

        for collaborator in &self.collaborators {
            let binding = collaborator.binding();
            tracing::debug!(collaborator = %binding.name, policy = %binding.failure_policy, "binding collaborator");
            stages.push(GlobalStage::Collaborator(binding));
        }

        let modules: Vec<_> =
            settings.resolve.modules.iter().map(|m| self.context.resolve_module_dir(m)).collect();

        let config = PipelineConfig {
            mode,
            entry: settings.entries.clone(),
            output: OutputSettings { path: self.context.out_dir() },
            resolve: ResolveSettings { modules: modules.clone(), alias: settings.resolve.alias.clone() },
            resolve_loader: LoaderResolveSettings { modules },
            externals: settings.externals.clone(),
            devtool: policy.devtool(),
            rules,
            stages,
            optimization,
        };
        tracing::debug!(
            rules = config.rules().len(),
            stages = ?config.stage_names(),
            "pipeline configuration assembled"
        );
        Ok(config)
    }

    /// Resolve the mode from the environment, then assemble.
    pub fn assemble_from_env(&self) -> Result<PipelineConfig, PipelineError> {
        self.assemble(resolve_mode())
    }

    /// Resolve every source against the configuration's rules.
    ///
    /// A script or style source no rule claims is fatal; other sources pass
    /// through. A source claimed by several rules is fatal in strict mode and
    /// otherwise resolved to the first declared rule with a warning.
    pub fn plan(
        &self,
        config: &PipelineConfig,
        sources: &[SourceDescriptor],
    ) -> Result<SourcePlan, PipelineError> {
        let mut plan = SourcePlan::new();
        for source in sources {
            plan.add(self.resolve_source(config.rules(), source)?);
        }
        tracing::debug!(sources = plan.len(), pass_through = plan.pass_through_count(), "source plan resolved");
        Ok(plan)
    }

    /// Discover sources under the source directory and plan them.
    pub fn discover_and_plan(&self, config: &PipelineConfig) -> Result<SourcePlan, PipelineError> {
        let sources = discover_sources(&self.context, config.rules().needs_content())?;
        self.plan(config, &sources)
    }

    /// Assemble and plan in one step; nothing is returned unless both pass.
    pub fn prepare(&self, mode: BuildMode) -> Result<(PipelineConfig, SourcePlan), PipelineError> {
        let config = self.assemble(mode)?;
        let plan = self.discover_and_plan(&config)?;
        Ok((config, plan))
    }

    /// Run the collaborators after the engine has consumed `config`.
    ///
    /// Advisory failures are recorded and the run continues, unless strict.
    /// Any other failure stops the phase with a collaborator failure.
    pub fn finish(&self, config: &PipelineConfig) -> Result<CollaboratorReport, PipelineError> {
        let start = Instant::now();
        let out_dir = self.context.out_dir();
        let ctx = CollaboratorContext {
            config,
            project_root: self.context.project_root(),
            out_dir: &out_dir,
        };

        let mut report = CollaboratorReport::new();
        for collaborator in &self.collaborators {
            let binding = collaborator.binding();
            let run_start = Instant::now();
            tracing::info!(collaborator = %binding.name, "running collaborator");

            let status = match collaborator.run(&ctx) {
                Ok(()) => CollaboratorStatus::Success,
                Err(err)
                    if binding.failure_policy == FailurePolicy::Advisory
                        && !self.context.is_strict() =>
                {
                    tracing::warn!(collaborator = %binding.name, error = %err, "advisory collaborator failed");
                    CollaboratorStatus::Degraded(err.message)
                }
                Err(err) => {
                    tracing::error!(collaborator = %binding.name, error = %err, "collaborator failed");
                    return Err(PipelineError::CollaboratorFailure {
                        name: binding.name,
                        message: err.message,
                    });
                }
            };
            report.add_run(CollaboratorRun::new(&binding, status, run_start.elapsed()));
        }

        Ok(report.with_duration(start.elapsed()))
    }

    fn resolve_source(
        &self,
        rules: &RuleSet,
        source: &SourceDescriptor,
    ) -> Result<ResolvedSource, PipelineError> {
        let path = source.normalized_path();
        let kind = SourceKind::from_path(&source.path);
        let candidates = rules.candidates(source);

        let rule = match candidates.as_slice() {
            [] if kind.requires_rule() => {
                return Err(PipelineError::configuration(path, format!("no rule matches this {} source", kind)));
            }
            [] => return Ok(ResolvedSource::pass_through(source.path.clone(), kind)),
            [rule] => *rule,
            [first, ..] => {
                let names = candidates.iter().map(|r| r.name()).collect::<Vec<_>>().join(", ");
                if self.context.is_strict() {
                    return Err(PipelineError::configuration(
                        path,
                        format!("ambiguous match, claimed by rules {}", names),
                    ));
                }
                tracing::warn!(source = %path, rules = %names, chosen = first.name(), "ambiguous rule match, first declared rule wins");
                *first
            }
        };

        Ok(ResolvedSource::claimed(
            source.path.clone(),
            rule.kind(),
            rule.name(),
            build_chain(rule).to_vec(),
        ))
    }

    /// Every entry path must be claimed by a script rule.
    fn check_entries(&self, rules: &RuleSet) -> Result<(), PipelineError> {
        for (bundle, paths) in &self.context.settings().entries {
            if paths.is_empty() {
                return Err(PipelineError::configuration(bundle.as_str(), "entry has no source paths"));
            }
            for path in paths {
                let descriptor = SourceDescriptor::new(path.as_str());
                match rules.match_source(&descriptor) {
                    Some(rule) if rule.kind() == SourceKind::Script => {}
                    Some(rule) => {
                        return Err(PipelineError::configuration(
                            path.as_str(),
                            format!("entry '{}' is claimed by non-script rule '{}'", bundle, rule.name()),
                        ));
                    }
                    None => {
                        return Err(PipelineError::configuration(
                            path.as_str(),
                            format!("entry '{}' matches no script rule", bundle),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Global stages every build carries, before mode additions.
    fn base_stages(&self) -> Vec<GlobalStage> {
        let settings = self.context.settings();
        let mut stages = Vec::new();
        if !settings.copy.files.is_empty() {
            stages.push(GlobalStage::Copy(CopyStage { patterns: settings.copy.files.clone() }));
        }
        stages.push(GlobalStage::ExtractStyles(ExtractStylesStage {
            filename: settings.styles.extract_filename.clone(),
        }));
        if settings.lint.enabled {
            stages.push(GlobalStage::Lint(LintStage::from(&settings.lint)));
        }
        stages
    }

    /// Output file names the configuration can produce.
    fn expected_artifacts(&self, rules: &RuleSet) -> Vec<String> {
        let settings = self.context.settings();
        let extracts_styles = rules
            .iter()
            .any(|r| r.kind() == SourceKind::Style && r.has_stage(StageKind::Extract));

        let mut artifacts = Vec::new();
        for bundle in settings.entries.keys() {
            artifacts.push(format!("{}.js", bundle));
            if extracts_styles {
                artifacts.push(settings.styles.extract_filename.replace("[name]", bundle));
            }
        }
        artifacts.extend(settings.copy.files.iter().filter_map(|f| {
            Path::new(f).file_name().map(|name| name.to_string_lossy().into_owned())
        }));
        artifacts
    }
}
