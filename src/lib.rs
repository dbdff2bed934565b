//! assetflow - Front-end asset pipeline orchestration
//!
//! This library provides functionality to:
//! - Classify source files with ordered, first-match-wins rules
//! - Route each class through an ordered chain of transformation stages
//! - Insert mode-dependent stages (compression, source maps, minimizers)
//! - Emit the declarative configuration consumed by the bundler engine
//! - Run post-build collaborators (translation extraction, remote sync)

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod mode;
pub mod policy;
pub mod rules;

pub use build::{BuildContext, PipelineConfig, PipelineOrchestrator};
pub use error::PipelineError;
pub use mode::{resolve_mode, BuildMode};
