//! Turns parsed arguments into a pipeline run

use crate::commands::Cli;
use crate::config::CliConfig;
use crate::error::{CovError, CovResult};
use crate::output::ProgressReporter;
use crate::paths::{locate_manifest, RepoPaths};
use crate::pipeline::CoveragePipeline;
use crate::settings::CoverageSettings;
use crate::summary::RunSummary;
use crate::tools::Toolchain;

/// Resolve paths and settings, then run the pipeline
pub fn execute(
    cli: &Cli,
    config: &CliConfig,
    tools: &impl Toolchain,
    reporter: &mut ProgressReporter,
) -> CovResult<RunSummary> {
    let manifest = match cli.manifest_path {
        Some(ref path) => path.clone(),
        None => locate_manifest(tools, cli.cargo.as_deref().unwrap_or("cargo"))?,
    };
    let root = manifest
        .canonicalize()
        .ok()
        .and_then(|m| m.parent().map(std::path::Path::to_path_buf))
        .ok_or_else(|| CovError::manifest_not_found(&manifest))?;

    let file_settings = match cli.config {
        Some(ref path) => CoverageSettings::load(path)?,
        None => CoverageSettings::discover(&root)?,
    };
    let settings = cli.apply_to(file_settings)?;

    let paths = RepoPaths::new(
        &manifest,
        cli.target_dir.as_deref(),
        settings.profile_dir_name(),
    )?;
    tracing::info!(
        root = %paths.root.display(),
        profile = %settings.profile,
        coverage_dir = %paths.coverage_dir.display(),
        "resolved workspace"
    );

    CoveragePipeline::new(&paths, &settings, tools, reporter).run(config.dry_run)
}
