//! Pipeline assembly for assetflow
//!
//! Turns project settings into the configuration consumed by the bundler
//! engine, and runs the post-build collaborators.
//!
//! # Overview
//!
//! The pipeline consists of:
//! - **Assembly**: Build the rule table, apply mode policies, bind collaborators
//! - **Planning**: Discover sources and resolve each to its rule and chain
//! - **Finishing**: Run translation extraction and remote sync after the engine
//!
//! # Example
//!
//! ```ignore
//! use assetflow::build::{BuildContext, PipelineOrchestrator};
//! use assetflow::config::CliOverrides;
//! use assetflow::mode::resolve_mode;
//!
//! let context = BuildContext::load(None, &CliOverrides::default())?;
//! let orchestrator = PipelineOrchestrator::new(context).with_standard_collaborators();
//!
//! let config = orchestrator.assemble(resolve_mode())?;
//! println!("{}", config.to_json_pretty()?);
//! ```

pub mod collaborator;
pub mod context;
pub mod discovery;
pub mod pipeline;
pub mod result;
pub mod target;

pub use collaborator::*;
pub use context::*;
pub use discovery::*;
pub use pipeline::*;
pub use result::*;
pub use target::*;
