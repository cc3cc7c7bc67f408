//! Repository path resolution
//!
//! All paths are derived once from the workspace manifest and never change
//! during a run.

use crate::error::{CovError, CovResult};
use crate::tools::{Invocation, Toolchain};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the merged report directory under the coverage root
pub const MERGED_DIR: &str = "merged";

/// Every filesystem location a run touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoPaths {
    /// Repository root (directory holding the manifest)
    pub root: PathBuf,
    /// Workspace `Cargo.toml`
    pub manifest: PathBuf,
    /// Cargo target directory
    pub target_dir: PathBuf,
    /// Build directory of the selected profile
    pub profile_dir: PathBuf,
    /// Per-binary coverage reports live here
    pub coverage_dir: PathBuf,
    /// Merged report
    pub merged_dir: PathBuf,
    /// `target_dir` came from the command line and must be handed to cargo
    #[serde(skip)]
    pub explicit_target_dir: bool,
}

impl RepoPaths {
    /// Derive all paths from the manifest
    ///
    /// `target_dir` overrides `<root>/target`; relative overrides are taken
    /// relative to the root. `profile_dir_name` is the directory cargo uses
    /// for the profile (`debug` for the dev profile).
    pub fn new(
        manifest: &Path,
        target_dir: Option<&Path>,
        profile_dir_name: &str,
    ) -> CovResult<Self> {
        let manifest = manifest
            .canonicalize()
            .map_err(|_| CovError::manifest_not_found(manifest))?;
        if !manifest.is_file() {
            return Err(CovError::manifest_not_found(manifest));
        }
        let root = manifest
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| CovError::manifest_not_found(&manifest))?;

        let resolved_target = match target_dir {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => root.join(dir),
            None => root.join("target"),
        };
        let profile_dir = resolved_target.join(profile_dir_name);
        let coverage_dir = resolved_target.join("coverage");
        let merged_dir = coverage_dir.join(MERGED_DIR);

        Ok(Self {
            root,
            manifest,
            target_dir: resolved_target,
            profile_dir,
            coverage_dir,
            merged_dir,
            explicit_target_dir: target_dir.is_some(),
        })
    }

    /// Create the coverage root if it does not exist yet
    pub fn ensure_coverage_dir(&self) -> CovResult<()> {
        std::fs::create_dir_all(&self.coverage_dir)?;
        Ok(())
    }

    /// Where cargo puts test binaries for the profile
    #[must_use]
    pub fn deps_dir(&self) -> PathBuf {
        self.profile_dir.join("deps")
    }

    /// Stable report name for a test binary
    ///
    /// The profile's `deps/` prefix is stripped, then the profile prefix,
    /// and anything else falls back to the bare file name.
    #[must_use]
    pub fn artifact_output_name(&self, artifact: &Path) -> String {
        let relative = artifact
            .strip_prefix(self.deps_dir())
            .or_else(|_| artifact.strip_prefix(&self.profile_dir))
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty());

        match relative {
            Some(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("-"),
            None => artifact
                .file_name()
                .map_or_else(|| "unnamed".to_string(), |n| n.to_string_lossy().into_owned()),
        }
    }

    /// Report directory for a test binary
    #[must_use]
    pub fn artifact_output_dir(&self, artifact: &Path) -> PathBuf {
        self.coverage_dir.join(self.artifact_output_name(artifact))
    }
}

/// Ask cargo for the workspace manifest of the current directory
pub fn locate_manifest(tools: &impl Toolchain, cargo: &str) -> CovResult<PathBuf> {
    let invocation = Invocation::new(cargo).args([
        "locate-project",
        "--workspace",
        "--message-format",
        "plain",
    ]);
    let stdout = tools.capture(&invocation)?;
    let manifest = stdout.trim();
    if manifest.is_empty() {
        return Err(CovError::manifest_not_found("Cargo.toml"));
    }
    Ok(PathBuf::from(manifest))
}
