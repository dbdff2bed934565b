//! Pipeline error taxonomy.
//!
//! Every error except [`PipelineError::CollaboratorFailure`] is raised while
//! the configuration is assembled, before anything is handed to the bundler
//! engine, so a failed run never leaves partial output behind.

use thiserror::Error;

use crate::build::DiscoveryError;
use crate::config::ConfigError;
use crate::policy::PolicyError;
use crate::rules::RuleError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Missing or ambiguous rule match for a script or style source, or a
    /// defective rule declaration
    #[error("configuration error for '{pattern}': {message}")]
    Configuration { pattern: String, message: String },
    /// A mode policy disagrees with an explicit declaration
    #[error("policy conflict in '{stage}': {message}")]
    PolicyConflict { stage: String, message: String },
    /// Translation extraction or remote sync reported failure
    #[error("collaborator '{name}' failed: {message}")]
    CollaboratorFailure { name: String, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl PipelineError {
    pub(crate) fn configuration(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Configuration { pattern: pattern.into(), message: message.into() }
    }
}

impl From<RuleError> for PipelineError {
    fn from(err: RuleError) -> Self {
        let message = err.to_string();
        match err {
            RuleError::InvalidPattern { pattern, .. } => PipelineError::Configuration { pattern, message },
            RuleError::DuplicateRule(rule) | RuleError::ChainOrder { rule, .. } => {
                PipelineError::Configuration { pattern: rule, message }
            }
        }
    }
}

impl From<PolicyError> for PipelineError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Conflict { stage, message } => PipelineError::PolicyConflict { stage, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_error_maps_to_configuration() {
        let err: PipelineError = RuleError::ChainOrder {
            rule: "vendor-styles".to_string(),
            message: "rewrite must be declared after extraction".to_string(),
        }
        .into();
        match err {
            PipelineError::Configuration { pattern, message } => {
                assert_eq!(pattern, "vendor-styles");
                assert!(message.contains("rewrite must be declared after extraction"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_policy_error_maps_to_conflict() {
        let err: PipelineError =
            PolicyError::Conflict { stage: "compress".to_string(), message: "x".to_string() }
                .into();
        assert!(matches!(err, PipelineError::PolicyConflict { .. }));
        assert_eq!(err.to_string(), "policy conflict in 'compress': x");
    }
}
