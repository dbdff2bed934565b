//! Declarative source rules.
//!
//! A rule pairs a source matcher (plus explicit exclusions) with the ordered
//! chain of stages that transforms the matched sources:
//! - **Matching**: [`RuleSet::match_source`] scans rules in declaration
//!   order, first non-excluded match wins
//! - **Chains**: [`build_chain`] returns a rule's stages verbatim,
//!   [`validate_chain`] checks their declared order
//! - **Defaults**: [`standard_rules`] declares the standard rule table

pub mod chain;
pub mod defaults;
pub mod matcher;
pub mod rule;
pub mod stage;

pub use chain::*;
pub use defaults::*;
pub use matcher::*;
pub use rule::*;
pub use stage::*;

use thiserror::Error;

/// Defect in a rule declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Regular expression failed to compile
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// Two rules share a name
    #[error("duplicate rule '{0}'")]
    DuplicateRule(String),
    /// A chain's declared stage order breaks an ordering invariant
    #[error("rule '{rule}': {message}")]
    ChainOrder { rule: String, message: String },
}
