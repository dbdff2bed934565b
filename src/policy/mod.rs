//! Mode-gated build policy.
//!
//! - [`StageInsertionPolicy`] adds compression, compressed style output, or
//!   source maps depending on the build mode
//! - [`select_optimization`] picks minimizers for production builds

pub mod insertion;
pub mod optimization;

pub use insertion::*;
pub use optimization::*;

use thiserror::Error;

/// A mode policy disagrees with an explicit declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{stage}: {message}")]
    Conflict { stage: String, message: String },
}
