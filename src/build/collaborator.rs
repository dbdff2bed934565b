//! External collaborators run after the bundler engine has finished.
//!
//! A collaborator is bound into the global stage list as a terminal stage and
//! later executed by [`crate::build::PipelineOrchestrator::finish`]. The
//! orchestrator only knows the [`Collaborator`] capability, so tests can
//! substitute recording or failing implementations.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

use crate::build::PipelineConfig;
use crate::config::{SyncConfig, TranslationsConfig};

/// Remote directory that synced projects are installed under.
pub const REMOTE_INSTALL_DIR: &str = "/usr/local/share/cockpit";

/// How a collaborator failure affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Logged and recorded; fatal only in strict mode
    Advisory,
    /// Always fails the run
    Required,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Advisory => write!(f, "advisory"),
            FailurePolicy::Required => write!(f, "required"),
        }
    }
}

/// Descriptor of a collaborator as recorded in the global stage list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorBinding {
    pub name: String,
    pub failure_policy: FailurePolicy,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        CollaboratorError::new(err.to_string())
    }
}

/// What a collaborator sees when it runs.
#[derive(Debug, Clone, Copy)]
pub struct CollaboratorContext<'a> {
    /// The configuration the engine consumed
    pub config: &'a PipelineConfig,
    pub project_root: &'a Path,
    /// Directory holding the finished artifacts
    pub out_dir: &'a Path,
}

/// Capability interface for post-build collaborators.
pub trait Collaborator {
    fn name(&self) -> &str;

    fn failure_policy(&self) -> FailurePolicy;

    /// Options recorded in the stage descriptor.
    fn options(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn binding(&self) -> CollaboratorBinding {
        CollaboratorBinding {
            name: self.name().to_string(),
            failure_policy: self.failure_policy(),
            options: self.options(),
        }
    }

    /// Run once all file-level work is complete.
    fn run(&self, ctx: &CollaboratorContext<'_>) -> Result<(), CollaboratorError>;
}

/// Spawn `program` with `args` in `dir`, failing on a non-zero exit.
fn run_command(program: &str, args: &[String], dir: &Path) -> Result<(), CollaboratorError> {
    tracing::debug!(program, ?args, dir = %dir.display(), "spawning collaborator command");
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| CollaboratorError::new(format!("failed to run {}: {}", program, e)))?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.lines().last().unwrap_or("").trim();
    let status = match output.status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    if detail.is_empty() {
        Err(CollaboratorError::new(format!("{} failed with {}", program, status)))
    } else {
        Err(CollaboratorError::new(format!("{} failed with {}: {}", program, status, detail)))
    }
}

/// Translation catalog extraction over the matched sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationExtraction {
    command: Vec<String>,
}

impl TranslationExtraction {
    pub const NAME: &'static str = "translations";

    /// `command` is the program followed by its arguments. An empty command
    /// makes the stage a no-op.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl From<&TranslationsConfig> for TranslationExtraction {
    fn from(config: &TranslationsConfig) -> Self {
        Self::new(config.command.clone())
    }
}

impl Collaborator for TranslationExtraction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Advisory
    }

    fn options(&self) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        if !self.command.is_empty() {
            options.insert("command".to_string(), self.command.join(" "));
        }
        options
    }

    fn run(&self, ctx: &CollaboratorContext<'_>) -> Result<(), CollaboratorError> {
        match self.command.split_first() {
            Some((program, args)) => run_command(program, args, ctx.project_root),
            None => {
                tracing::debug!("no translation command configured");
                Ok(())
            }
        }
    }
}

/// Push of the output directory to a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSync {
    destination: String,
    host: Option<String>,
    program: String,
}

impl RemoteSync {
    pub const NAME: &'static str = "remote-sync";

    pub fn new(destination: impl Into<String>, host: Option<String>, program: impl Into<String>) -> Self {
        Self { destination: destination.into(), host, program: program.into() }
    }

    pub fn from_config(config: &SyncConfig, destination: impl Into<String>) -> Self {
        Self::new(destination, config.host.clone(), config.program.as_str())
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Remote target, `None` when no host is configured.
    pub fn target(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("{}:{}/{}", host, REMOTE_INSTALL_DIR, self.destination))
    }

    /// Arguments for syncing `out_dir`, `None` when no host is configured.
    pub fn command_args(&self, out_dir: &Path) -> Option<Vec<String>> {
        let target = self.target()?;
        // trailing slash: sync directory contents, not the directory itself
        let mut source = out_dir.to_string_lossy().into_owned();
        if !source.ends_with('/') {
            source.push('/');
        }
        Some(vec![
            "--recursive".to_string(),
            "--info=PROGRESS2".to_string(),
            "--delete".to_string(),
            source,
            target,
        ])
    }
}

impl Collaborator for RemoteSync {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Required
    }

    fn options(&self) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        options.insert("dest".to_string(), self.destination.clone());
        if let Some(host) = &self.host {
            options.insert("host".to_string(), host.clone());
        }
        options
    }

    fn run(&self, ctx: &CollaboratorContext<'_>) -> Result<(), CollaboratorError> {
        let Some(args) = self.command_args(ctx.out_dir) else {
            tracing::debug!(dest = %self.destination, "no sync host configured, skipping");
            return Ok(());
        };
        tracing::info!(target = ?self.target(), "syncing build output");
        run_command(&self.program, &args, ctx.project_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_binding() {
        let translations = TranslationExtraction::new(vec!["po-extract".to_string(), "src".to_string()]);
        let binding = translations.binding();
        assert_eq!(binding.name, "translations");
        assert_eq!(binding.failure_policy, FailurePolicy::Advisory);
        assert_eq!(binding.options.get("command").map(String::as_str), Some("po-extract src"));
    }

    #[test]
    fn test_remote_sync_binding() {
        let sync = RemoteSync::new("starter-kit", None, "rsync");
        let binding = sync.binding();
        assert_eq!(binding.name, "remote-sync");
        assert_eq!(binding.failure_policy, FailurePolicy::Required);
        assert_eq!(binding.options.get("dest").map(String::as_str), Some("starter-kit"));
        assert!(!binding.options.contains_key("host"));
    }

    #[test]
    fn test_remote_sync_target() {
        let sync = RemoteSync::new("starter-kit", Some("c".to_string()), "rsync");
        assert_eq!(sync.target().as_deref(), Some("c:/usr/local/share/cockpit/starter-kit"));
        assert_eq!(RemoteSync::new("starter-kit", None, "rsync").target(), None);
    }

    #[test]
    fn test_remote_sync_command_args() {
        let sync = RemoteSync::new("kit", Some("host".to_string()), "rsync");
        let args = sync.command_args(Path::new("/project/dist")).unwrap();
        assert_eq!(
            args,
            vec!["--recursive", "--info=PROGRESS2", "--delete", "/project/dist/", "host:/usr/local/share/cockpit/kit"]
        );
    }

    #[test]
    fn test_binding_serialization() {
        let json = serde_json::to_value(RemoteSync::new("kit", None, "rsync").binding()).unwrap();
        assert_eq!(json["failurePolicy"], "required");
        assert_eq!(json["options"]["dest"], "kit");

        let empty = serde_json::to_value(TranslationExtraction::new(vec![]).binding()).unwrap();
        assert!(empty.get("options").is_none());
    }

    #[test]
    fn test_failure_policy_display() {
        assert_eq!(FailurePolicy::Advisory.to_string(), "advisory");
        assert_eq!(FailurePolicy::Required.to_string(), "required");
    }
}
