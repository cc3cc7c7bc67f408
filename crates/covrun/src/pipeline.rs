//! Coverage pipeline: build, discover, run kcov, merge
//!
//! Steps run strictly in order and the first failing step ends the run.
//! Nothing is cleaned up on failure; the next run overwrites per-binary
//! reports and always recreates `merged/`.

use crate::artifact::{parse_build_output, TestArtifact};
use crate::error::{CovError, CovResult};
use crate::kcov::{Kcov, INSTALL_HINT};
use crate::output::ProgressReporter;
use crate::package::PackageLocator;
use crate::paths::RepoPaths;
use crate::settings::CoverageSettings;
use crate::summary::{CoveredArtifact, MergedTotals, RunSummary};
use crate::tools::{Invocation, Toolchain};

/// `cargo test --no-run` with JSON messages for the configured profile
///
/// An explicit target directory is passed on so cargo writes the binaries
/// where the output names are derived from.
#[must_use]
pub fn build_invocation(paths: &RepoPaths, settings: &CoverageSettings) -> Invocation {
    let mut invocation = Invocation::new(&settings.cargo)
        .args(["test", "--no-run", "--message-format=json"])
        .arg("--manifest-path")
        .arg(&paths.manifest);
    if paths.explicit_target_dir {
        invocation = invocation.arg("--target-dir").arg(&paths.target_dir);
    }
    invocation
        .args(settings.profile_args())
        .args(&settings.build_args)
        .current_dir(&paths.root)
}

/// One coverage run over a workspace
#[derive(Debug)]
pub struct CoveragePipeline<'a, T: Toolchain> {
    paths: &'a RepoPaths,
    settings: &'a CoverageSettings,
    tools: &'a T,
    reporter: &'a mut ProgressReporter,
}

impl<'a, T: Toolchain> CoveragePipeline<'a, T> {
    /// Create a pipeline
    pub fn new(
        paths: &'a RepoPaths,
        settings: &'a CoverageSettings,
        tools: &'a T,
        reporter: &'a mut ProgressReporter,
    ) -> Self {
        Self {
            paths,
            settings,
            tools,
            reporter,
        }
    }

    /// Run every step; with `dry_run` kcov is never invoked
    pub fn run(&mut self, dry_run: bool) -> CovResult<RunSummary> {
        self.paths.ensure_coverage_dir()?;
        self.probe_kcov()?;

        let artifacts = self.build_tests()?;
        let (planned, skipped) = self.plan(artifacts)?;

        let mut summary = RunSummary {
            covered: Vec::with_capacity(planned.len()),
            skipped,
            dry_run,
            ..RunSummary::default()
        };

        if dry_run {
            let kcov = Kcov::new(self.settings);
            self.reporter.header("Planned kcov runs");
            for item in &planned {
                let invocation =
                    kcov.coverage(&item.artifact.path, &item.package_dir, &item.output_dir);
                self.reporter.info(&invocation.to_string());
            }
            summary.covered = planned;
            return Ok(summary);
        }

        summary.covered = self.collect(planned)?;
        summary.merged_dir = self.merge(&summary.coverage_dirs())?;
        summary.totals = summary
            .merged_dir
            .as_deref()
            .and_then(MergedTotals::read);

        Ok(summary)
    }

    fn probe_kcov(&self) -> CovResult<()> {
        let program = &self.settings.kcov;
        match self.tools.locate(program) {
            Some(path) => {
                tracing::debug!(kcov = %path.display(), "found coverage tool");
                Ok(())
            }
            None => Err(CovError::missing_tool(program, INSTALL_HINT)),
        }
    }

    fn build_tests(&self) -> CovResult<Vec<TestArtifact>> {
        self.reporter.info("Building tests (cargo test --no-run)");
        let invocation = build_invocation(self.paths, self.settings);
        tracing::info!(command = %invocation, "building test binaries");

        let stdout = self.tools.capture(&invocation)?;
        let artifacts = parse_build_output(&stdout);
        tracing::info!(count = artifacts.len(), "test binaries built");
        Ok(artifacts)
    }

    /// Pair each binary with its package directory, dropping the ones without
    fn plan(
        &self,
        artifacts: Vec<TestArtifact>,
    ) -> CovResult<(Vec<CoveredArtifact>, Vec<TestArtifact>)> {
        let locator = PackageLocator::load(&self.paths.root, &self.paths.manifest)?;
        tracing::debug!(root_package = ?locator.root_package(), "planning kcov runs");
        let mut planned = Vec::new();
        let mut skipped = Vec::new();

        for artifact in artifacts {
            match locator.source_dir(&artifact.package) {
                Some(package_dir) => {
                    let output_dir = self.paths.artifact_output_dir(&artifact.path);
                    planned.push(CoveredArtifact {
                        artifact,
                        package_dir,
                        output_dir,
                    });
                }
                None => skipped.push(artifact),
            }
        }

        Ok((planned, skipped))
    }

    fn collect(&mut self, planned: Vec<CoveredArtifact>) -> CovResult<Vec<CoveredArtifact>> {
        let kcov = Kcov::new(self.settings);
        let mut covered = Vec::with_capacity(planned.len());

        self.reporter.header("Collecting coverage");
        self.reporter
            .start_progress(planned.len() as u64, "Starting...");

        for item in planned {
            let name = self.paths.artifact_output_name(&item.artifact.path);
            self.reporter.set_message(&name);

            let invocation = kcov.coverage(&item.artifact.path, &item.package_dir, &item.output_dir);
            tracing::info!(package = %item.artifact.package, artifact = %name, "running kcov");

            if let Err(e) = self.tools.run(&invocation) {
                self.reporter.failure(&format!("{name}: {e}"));
                self.reporter.finish();
                return Err(e);
            }

            self.reporter.success(&name);
            self.reporter.increment(1);
            covered.push(item);
        }

        self.reporter.finish();
        Ok(covered)
    }

    /// Replace `merged/` with a fresh merge of `inputs`
    fn merge(&self, inputs: &[std::path::PathBuf]) -> CovResult<Option<std::path::PathBuf>> {
        let merged_dir = &self.paths.merged_dir;
        if merged_dir.exists() {
            tracing::debug!(dir = %merged_dir.display(), "removing stale merged report");
            std::fs::remove_dir_all(merged_dir)?;
        }

        if inputs.is_empty() {
            tracing::warn!("no coverage reports to merge");
            self.reporter.warning("No test binaries were covered, skipping merge");
            return Ok(None);
        }

        let invocation = Kcov::new(self.settings).merge(merged_dir, inputs);
        tracing::info!(inputs = inputs.len(), "merging coverage reports");
        self.tools.run(&invocation)?;
        self.reporter.success(&format!("Merged report: {}", merged_dir.display()));
        Ok(Some(merged_dir.clone()))
    }
}
