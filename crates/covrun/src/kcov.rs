//! kcov command lines
//!
//! Builds the per-binary and merge invocations. Running them is left to the
//! [`Toolchain`](crate::tools::Toolchain).

use crate::settings::{CoverageSettings, ExclusionRules};
use crate::tools::Invocation;
use std::path::{Path, PathBuf};

/// Environment variable pointing kcov's child at the package root
pub const MANIFEST_DIR_ENV: &str = "CARGO_MANIFEST_DIR";

/// Install hint shown when kcov is missing
pub const INSTALL_HINT: &str =
    "Install kcov (https://github.com/SimonKagstrom/kcov) or point --kcov / COVRUN_KCOV at it.";

/// Builds kcov invocations from the run settings
#[derive(Debug, Clone)]
pub struct Kcov<'a> {
    program: &'a str,
    exclusions: &'a ExclusionRules,
    include_dirs: &'a [String],
    extra_args: &'a [String],
}

impl<'a> Kcov<'a> {
    /// Borrow what kcov needs from the settings
    #[must_use]
    pub fn new(settings: &'a CoverageSettings) -> Self {
        Self {
            program: &settings.kcov,
            exclusions: &settings.exclusions,
            include_dirs: &settings.include_dirs,
            extra_args: &settings.kcov_args,
        }
    }

    /// Comma-separated path prefixes kcov reports on for one package
    #[must_use]
    pub fn include_pattern(&self, package_dir: &Path) -> String {
        self.include_dirs
            .iter()
            .map(|dir| {
                let mut prefix = package_dir.join(dir).to_string_lossy().into_owned();
                if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
                    prefix.push(std::path::MAIN_SEPARATOR);
                }
                prefix
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Collect coverage for one test binary into `output_dir`
    #[must_use]
    pub fn coverage(&self, artifact: &Path, package_dir: &Path, output_dir: &Path) -> Invocation {
        Invocation::new(self.program)
            .env(MANIFEST_DIR_ENV, package_dir)
            .arg(format!("--include-pattern={}", self.include_pattern(package_dir)))
            .args(self.exclusions.kcov_args())
            .args(self.extra_args)
            .arg(output_dir)
            .arg(artifact)
    }

    /// Merge per-binary reports into `merged_dir`
    #[must_use]
    pub fn merge(&self, merged_dir: &Path, inputs: &[PathBuf]) -> Invocation {
        Invocation::new(self.program)
            .arg("--merge")
            .args(self.exclusions.kcov_args())
            .arg(merged_dir)
            .args(inputs)
    }
}
