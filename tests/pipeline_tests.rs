//! Pipeline integration tests.
//!
//! Drives the orchestrator over real project trees in temporary directories:
//!
//! - Configuration assembly in both modes
//! - Idempotence of the emitted configuration
//! - Vendor stylesheet chain ordering
//! - Source discovery and planning
//! - Collaborator ordering and failure policies

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serial_test::serial;
use tempfile::TempDir;

use assetflow::build::{
    BuildContext, Collaborator, CollaboratorContext, CollaboratorError, FailurePolicy,
    PipelineOrchestrator,
};
use assetflow::config::CliOverrides;
use assetflow::mode::{resolve_mode, BuildMode, MODE_ENV_VAR};
use assetflow::policy::GlobalStage;
use assetflow::rules::{
    chain_kinds, SourceDescriptor, StageKind, DISCARDED_STYLE_RULE, SCRIPT_RULE,
    STATIC_ASSET_RULE, STYLE_RULE, VENDOR_STYLE_RULE,
};
use assetflow::PipelineError;

// ============================================================================
// Test Utilities
// ============================================================================

const CONFIG: &str = r#"
[entries]
index = ["src/index.js"]
"#;

/// Create a file with content, creating parent directories.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// Create a project tree shaped like the standard starter layout.
fn create_project(config: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let config_path = create_test_file(root, "assetflow.toml", config);
    create_test_file(root, "package.json", r#"{"name": "starter-kit", "version": "0.1.0"}"#);
    create_test_file(root, "src/index.js", "import './app.scss';\n");
    create_test_file(root, "src/app.jsx", "export const App = () => null;\n");
    create_test_file(root, "src/app.scss", "@import 'patternfly-4-cockpit.scss';\n");
    create_test_file(root, "src/lib/patternfly-4-cockpit.scss", "$fa-font-path: 'x';\n");
    create_test_file(root, "src/index.html", "<html></html>\n");
    create_test_file(root, "src/manifest.json", "{}\n");
    create_test_file(root, "src/logo.svg", "<svg/>\n");
    create_test_file(root, "src/node_modules/left-pad/index.js", "module.exports = 1;\n");
    (temp, config_path)
}

fn load_orchestrator(config_path: &Path) -> PipelineOrchestrator {
    let context = BuildContext::load(Some(config_path), &CliOverrides::default()).unwrap();
    PipelineOrchestrator::new(context)
}

/// Collaborator that records its runs into a shared log.
struct RecordingCollaborator {
    name: &'static str,
    policy: FailurePolicy,
    fail: bool,
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingCollaborator {
    fn new(name: &'static str, policy: FailurePolicy, log: &Rc<RefCell<Vec<String>>>) -> Self {
        Self { name, policy, fail: false, log: Rc::clone(log) }
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Collaborator for RecordingCollaborator {
    fn name(&self) -> &str {
        self.name
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    fn run(&self, ctx: &CollaboratorContext<'_>) -> Result<(), CollaboratorError> {
        self.log.borrow_mut().push(format!("{}:{}", self.name, ctx.config.mode()));
        if self.fail {
            Err(CollaboratorError::new(format!("{} unavailable", self.name)))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn test_development_scenario() {
    let (_temp, config_path) = create_project(CONFIG);
    let config = load_orchestrator(&config_path).assemble(BuildMode::Development).unwrap();

    assert_eq!(config.entry().len(), 1);
    assert_eq!(config.entry()["index"], vec!["src/index.js".to_string()]);
    assert_eq!(config.compression_stage_count(), 0);
    assert!(config.has_source_maps());
    assert_eq!(config.devtool(), Some("source-map"));
    assert!(config.optimization().minimizers.is_empty());
}

#[test]
fn test_production_scenario() {
    let (_temp, config_path) = create_project(CONFIG);
    let config = load_orchestrator(&config_path).assemble(BuildMode::Production).unwrap();

    assert_eq!(config.entry()["index"], vec!["src/index.js".to_string()]);
    assert!(matches!(config.stages()[0], GlobalStage::Compress(_)));
    assert_eq!(config.compression_stage_count(), 1);
    assert!(!config.has_source_maps());
    assert_eq!(config.devtool(), None);

    let optimization = config.optimization();
    assert!(optimization.minimize);
    let script = optimization.script_minimizer().expect("script minimizer");
    assert_eq!(script.extract_comments.license_file_for("index.js"), "index.js.LICENSE.txt");
    let style = optimization.style_minimizer().expect("style minimizer");
    assert_eq!(style.tool, "cssnano");
}

#[test]
fn test_production_json_handoff() {
    let (_temp, config_path) = create_project(CONFIG);
    let config = load_orchestrator(&config_path).assemble(BuildMode::Production).unwrap();
    let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();

    assert_eq!(json["mode"], "production");
    assert_eq!(json["stages"][0]["stage"], "compress");
    assert_eq!(json["stages"][0]["deleteOriginalAssets"], true);
    assert!(json.get("devtool").is_none());
    assert_eq!(json["optimization"]["minimizer"][1]["preset"], "lite");
    assert!(!json.to_string().contains("sourceMap"));

    let styles = json["rules"].as_array().unwrap().iter().find(|r| r["name"] == STYLE_RULE).unwrap();
    assert_eq!(styles["use"][1]["options"]["sassOptions"]["outputStyle"], "compressed");
}

#[test]
fn test_assembly_is_idempotent() {
    let (_temp, config_path) = create_project(CONFIG);
    for mode in [BuildMode::Development, BuildMode::Production] {
        let first = load_orchestrator(&config_path).assemble(mode).unwrap();
        let second = load_orchestrator(&config_path).assemble(mode).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
    }
}

#[test]
fn test_rule_declaration_order() {
    let (_temp, config_path) = create_project(CONFIG);
    let config = load_orchestrator(&config_path).assemble(BuildMode::Development).unwrap();
    let names: Vec<_> = config.rules().iter().map(|r| r.name()).collect();
    assert_eq!(
        names,
        vec![SCRIPT_RULE, VENDOR_STYLE_RULE, DISCARDED_STYLE_RULE, STYLE_RULE, STATIC_ASSET_RULE]
    );
}

#[test]
fn test_invalid_config_fails_before_assembly() {
    let (_temp, config_path) = create_project("[styles]\ntest = \"[\"\n");
    let result = BuildContext::load(Some(&config_path), &CliOverrides::default());
    assert!(result.is_err());
}

#[test]
fn test_entry_without_script_rule() {
    let (_temp, config_path) = create_project("[entries]\nindex = [\"src/index.ts\"]\n");
    let err = load_orchestrator(&config_path).assemble(BuildMode::Development).unwrap_err();
    match err {
        PipelineError::Configuration { pattern, .. } => assert_eq!(pattern, "src/index.ts"),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_assemble_from_env() {
    let (_temp, config_path) = create_project(CONFIG);
    let orchestrator = load_orchestrator(&config_path);

    std::env::set_var(MODE_ENV_VAR, "production");
    assert_eq!(resolve_mode(), BuildMode::Production);
    let config = orchestrator.assemble_from_env().unwrap();
    assert_eq!(config.mode(), BuildMode::Production);

    std::env::set_var(MODE_ENV_VAR, "Production");
    assert_eq!(orchestrator.assemble_from_env().unwrap().mode(), BuildMode::Development);

    std::env::remove_var(MODE_ENV_VAR);
    assert_eq!(orchestrator.assemble_from_env().unwrap().mode(), BuildMode::Development);
}

// ============================================================================
// Matching and Planning
// ============================================================================

#[test]
fn test_vendor_chain_order() {
    let (_temp, config_path) = create_project(CONFIG);
    let config = load_orchestrator(&config_path).assemble(BuildMode::Development).unwrap();

    let source = SourceDescriptor::new("src/lib/patternfly-4-cockpit.scss");
    let rule = config.rules().match_source(&source).unwrap();
    assert_eq!(rule.name(), VENDOR_STYLE_RULE);
    assert_eq!(chain_kinds(rule), vec![StageKind::Extract, StageKind::Rewrite, StageKind::Compile]);
    assert_eq!(config.rules().candidates(&source).len(), 1);
}

#[test]
fn test_discover_and_plan() {
    let (_temp, config_path) = create_project(CONFIG);
    let orchestrator = load_orchestrator(&config_path);
    let (_, plan) = orchestrator.prepare(BuildMode::Development).unwrap();

    let rule_of = |path: &str| plan.get(path).and_then(|s| s.rule.clone());
    assert_eq!(rule_of("src/index.js").as_deref(), Some(SCRIPT_RULE));
    assert_eq!(rule_of("src/app.jsx").as_deref(), Some(SCRIPT_RULE));
    assert_eq!(rule_of("src/app.scss").as_deref(), Some(STYLE_RULE));
    assert_eq!(rule_of("src/lib/patternfly-4-cockpit.scss").as_deref(), Some(VENDOR_STYLE_RULE));
    assert_eq!(rule_of("src/index.html").as_deref(), Some(STATIC_ASSET_RULE));
    assert_eq!(rule_of("src/manifest.json").as_deref(), Some(STATIC_ASSET_RULE));
    assert!(plan.get("src/logo.svg").unwrap().is_pass_through());
    assert!(plan.get("src/node_modules/left-pad/index.js").is_none());
    assert_eq!(plan.len(), 7);
}

#[test]
fn test_plan_carries_mode_options() {
    let (_temp, config_path) = create_project(CONFIG);
    let orchestrator = load_orchestrator(&config_path);

    let (_, dev) = orchestrator.prepare(BuildMode::Development).unwrap();
    let styles = dev.get("src/app.scss").unwrap();
    assert!(styles.stages.iter().all(|s| s.has_source_map()));

    let (_, prod) = orchestrator.prepare(BuildMode::Production).unwrap();
    let styles = prod.get("src/app.scss").unwrap();
    assert!(styles.stages.iter().all(|s| !s.has_source_map()));
}

#[test]
fn test_unmatched_stylesheet_is_fatal() {
    let (temp, config_path) =
        create_project(&format!("{}\n[styles]\ntest = '\\.scss$'\n", CONFIG));
    create_test_file(temp.path(), "src/legacy.css", "a {}\n");

    let err = load_orchestrator(&config_path).prepare(BuildMode::Development).unwrap_err();
    match err {
        PipelineError::Configuration { pattern, .. } => assert_eq!(pattern, "src/legacy.css"),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_discarded_component_styles() {
    let (temp, config_path) = create_project(CONFIG);
    create_test_file(
        temp.path(),
        "src/@patternfly/react-styles/css/components/Table/table.css",
        ".pf-c-table {}\n",
    );
    let (_, plan) = load_orchestrator(&config_path).prepare(BuildMode::Development).unwrap();
    let table = plan.get("src/@patternfly/react-styles/css/components/Table/table.css").unwrap();
    assert_eq!(table.rule.as_deref(), Some(DISCARDED_STYLE_RULE));
    assert_eq!(table.stages.len(), 1);
    assert_eq!(table.stages[0].kind(), StageKind::Discard);
}

#[test]
fn test_vendor_content_marker_reads_sources() {
    let (temp, config_path) =
        create_project(&format!("{}\n[styles.vendor]\ncontent = 'fa-font-path'\n", CONFIG));
    create_test_file(temp.path(), "src/theme/patternfly-4-cockpit.scss", "a { color: red; }\n");

    let (config, plan) = load_orchestrator(&config_path).prepare(BuildMode::Development).unwrap();
    assert!(config.rules().needs_content());
    let rule_of = |path: &str| plan.get(path).and_then(|s| s.rule.clone());
    assert_eq!(rule_of("src/lib/patternfly-4-cockpit.scss").as_deref(), Some(VENDOR_STYLE_RULE));
    assert_eq!(rule_of("src/theme/patternfly-4-cockpit.scss").as_deref(), Some(STYLE_RULE));
}

// ============================================================================
// Collaborators
// ============================================================================

#[test]
fn test_collaborators_run_after_assembly_in_order() {
    let (_temp, config_path) = create_project(CONFIG);
    let log = Rc::new(RefCell::new(Vec::new()));
    let orchestrator = load_orchestrator(&config_path)
        .with_collaborator(RecordingCollaborator::new("translations", FailurePolicy::Advisory, &log))
        .with_collaborator(RecordingCollaborator::new("remote-sync", FailurePolicy::Required, &log));

    let config = orchestrator.assemble(BuildMode::Production).unwrap();
    assert!(log.borrow().is_empty(), "assembly must not run collaborators");
    let names = config.stage_names();
    assert_eq!(&names[names.len() - 2..], &["translations", "remote-sync"]);

    let report = orchestrator.finish(&config).unwrap();
    assert!(report.is_clean());
    assert_eq!(*log.borrow(), vec!["translations:production", "remote-sync:production"]);
}

#[test]
fn test_advisory_failure_tolerated_unless_strict() {
    let (_temp, config_path) = create_project(CONFIG);
    let log = Rc::new(RefCell::new(Vec::new()));
    let orchestrator = load_orchestrator(&config_path).with_collaborator(
        RecordingCollaborator::new("translations", FailurePolicy::Advisory, &log).failing(),
    );
    let config = orchestrator.assemble(BuildMode::Development).unwrap();
    let report = orchestrator.finish(&config).unwrap();
    assert_eq!(report.degraded_count(), 1);
    assert!(report.summary().contains("translations unavailable"));

    let overrides = CliOverrides { strict: Some(true), ..Default::default() };
    let context = BuildContext::load(Some(&config_path), &overrides).unwrap();
    let strict = PipelineOrchestrator::new(context).with_collaborator(
        RecordingCollaborator::new("translations", FailurePolicy::Advisory, &log).failing(),
    );
    let config = strict.assemble(BuildMode::Development).unwrap();
    let err = strict.finish(&config).unwrap_err();
    assert!(matches!(err, PipelineError::CollaboratorFailure { .. }));
}

#[test]
fn test_required_failure_stops_collaborators() {
    let (_temp, config_path) = create_project(CONFIG);
    let log = Rc::new(RefCell::new(Vec::new()));
    let orchestrator = load_orchestrator(&config_path)
        .with_collaborator(
            RecordingCollaborator::new("remote-sync", FailurePolicy::Required, &log).failing(),
        )
        .with_collaborator(RecordingCollaborator::new("notify", FailurePolicy::Advisory, &log));
    let config = orchestrator.assemble(BuildMode::Development).unwrap();

    let err = orchestrator.finish(&config).unwrap_err();
    assert_eq!(err.to_string(), "collaborator 'remote-sync' failed: remote-sync unavailable");
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_standard_collaborators_without_host_are_noops() {
    let (_temp, config_path) = create_project(CONFIG);
    let orchestrator = load_orchestrator(&config_path).with_standard_collaborators();
    let config = orchestrator.assemble(BuildMode::Production).unwrap();

    let sync = config.collaborator_bindings().find(|b| b.name == "remote-sync").unwrap();
    assert_eq!(sync.options.get("dest").map(String::as_str), Some("starter-kit"));

    let report = orchestrator.finish(&config).unwrap();
    assert_eq!(report.success_count(), 2);
}
