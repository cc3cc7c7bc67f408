//! covrun: merged kcov coverage for a Cargo workspace
//!
//! ## Usage
//!
//! ```bash
//! covrun                               # debug profile, kcov from PATH
//! covrun --build-arg=--workspace       # pass extra flags to cargo
//! covrun --dry-run                     # show the kcov runs without executing them
//! covrun --json > coverage-run.json    # machine-readable summary
//! ```

use clap::Parser;
use covrun::{
    logging, Cli, CliConfig, CovResult, OutputFormat, ProgressReporter, RunSummary,
    SystemToolchain,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.cli_config();
    logging::init_tracing(config.verbosity);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &CliConfig) -> CovResult<()> {
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let summary = covrun::execute(cli, config, &SystemToolchain, &mut reporter)?;
    print_summary(config, &reporter, &summary)
}

fn print_summary(
    config: &CliConfig,
    reporter: &ProgressReporter,
    summary: &RunSummary,
) -> CovResult<()> {
    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => reporter.summary(summary),
    }
    Ok(())
}
