//! Pipeline command implementations (config, plan, finish)

use std::path::Path;
use std::process::ExitCode;

use super::{PipelineArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::{BuildContext, PipelineOrchestrator};
use crate::config::CliOverrides;
use crate::mode::{resolve_mode, BuildMode};

/// Load the context and orchestrator, or the exit code to fail with.
fn load_orchestrator(
    args: &PipelineArgs,
    out: Option<&Path>,
) -> Result<PipelineOrchestrator, ExitCode> {
    if let Some(path) = &args.config {
        if !path.is_file() {
            eprintln!("Error: config file not found: {}", path.display());
            return Err(ExitCode::from(EXIT_INVALID_ARGS));
        }
    }

    let overrides = CliOverrides {
        out: out.map(Path::to_path_buf),
        src: args.src.clone(),
        strict: args.strict.then_some(true),
    };
    match BuildContext::load(args.config.as_deref(), &overrides) {
        Ok(context) => Ok(PipelineOrchestrator::new(context).with_standard_collaborators()),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Explicit `--mode`, else the environment.
fn mode_for(args: &PipelineArgs) -> BuildMode {
    args.mode.unwrap_or_else(resolve_mode)
}

/// Run the config command
pub fn run_config(args: &PipelineArgs, out: Option<&Path>, compact: bool) -> ExitCode {
    let orchestrator = match load_orchestrator(args, out) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    // Sources are resolved before anything is printed
    let config = match orchestrator.prepare(mode_for(args)) {
        Ok((config, _)) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let json = if compact { config.to_json() } else { config.to_json_pretty() };
    match json {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error serializing configuration: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the plan command
pub fn run_plan(args: &PipelineArgs, json: bool) -> ExitCode {
    let orchestrator = match load_orchestrator(args, None) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    let mode = mode_for(args);
    let plan = match orchestrator.prepare(mode) {
        Ok((_, plan)) => plan,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing plan: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        println!("Source plan ({} build):", mode);
        println!("{}", plan.summary());
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Run the finish command
pub fn run_finish(args: &PipelineArgs) -> ExitCode {
    let orchestrator = match load_orchestrator(args, None) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };

    let result = orchestrator
        .prepare(mode_for(args))
        .and_then(|(config, _)| orchestrator.finish(&config));
    match result {
        Ok(report) => {
            println!("{}", report.summary());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
