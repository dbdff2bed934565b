//! assetflow - Command-line tool for assembling asset pipeline configurations

use std::process::ExitCode;

use assetflow::cli;

fn main() -> ExitCode {
    cli::run()
}
