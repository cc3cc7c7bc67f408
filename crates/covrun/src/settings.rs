//! Coverage settings: `covrun.yaml` plus defaults
//!
//! Every field is optional in the file. Values left out fall back to the
//! defaults, which reproduce a plain `cargo test` + `kcov` run over the
//! `debug` profile.

use crate::error::{CovError, CovResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file looked up at the repository root
pub const SETTINGS_FILE: &str = "covrun.yaml";

/// Source markers kcov should ignore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExclusionRules {
    /// Lines containing this marker are not counted
    pub line: String,
    /// Start of an ignored region
    pub region_start: String,
    /// End of an ignored region
    pub region_end: String,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            line: "kcov-ignore".to_string(),
            region_start: "kcov-ignore-start".to_string(),
            region_end: "kcov-ignore-end".to_string(),
        }
    }
}

impl ExclusionRules {
    /// Parse a `START:END` region value
    pub fn parse_region(value: &str) -> CovResult<(String, String)> {
        match value.split_once(':') {
            Some((start, end)) if !start.is_empty() && !end.is_empty() => {
                Ok((start.to_string(), end.to_string()))
            }
            _ => Err(CovError::config(format!(
                "exclude region must look like START:END, got '{value}'"
            ))),
        }
    }

    /// kcov arguments applying both rules
    #[must_use]
    pub fn kcov_args(&self) -> [String; 2] {
        [
            format!("--exclude-line={}", self.line),
            format!(
                "--exclude-region={}:{}",
                self.region_start, self.region_end
            ),
        ]
    }

    fn validate(&self) -> CovResult<()> {
        if self.line.is_empty() {
            return Err(CovError::config("exclude line marker is empty"));
        }
        if self.region_start.is_empty() || self.region_end.is_empty() {
            return Err(CovError::config("exclude region markers must not be empty"));
        }
        // kcov splits the region argument on the first ':'
        if self.region_start.contains(':') {
            return Err(CovError::config(format!(
                "exclude region start '{}' must not contain ':'",
                self.region_start
            )));
        }
        Ok(())
    }
}

/// Effective settings for one coverage run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageSettings {
    /// Cargo profile the tests are built with
    pub profile: String,
    /// kcov program
    pub kcov: String,
    /// cargo program
    pub cargo: String,
    /// Ignore markers
    pub exclusions: ExclusionRules,
    /// Package subdirectories kcov reports on
    pub include_dirs: Vec<String>,
    /// Extra arguments for `cargo test --no-run`
    pub build_args: Vec<String>,
    /// Extra arguments for each per-binary kcov run
    pub kcov_args: Vec<String>,
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            profile: "debug".to_string(),
            kcov: "kcov".to_string(),
            cargo: "cargo".to_string(),
            exclusions: ExclusionRules::default(),
            include_dirs: vec!["src".to_string(), "tests".to_string()],
            build_args: Vec::new(),
            kcov_args: Vec::new(),
        }
    }
}

impl CoverageSettings {
    /// Create default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(yaml: &str) -> CovResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| CovError::config(format!("invalid settings: {e}")))
    }

    /// Load settings from an explicit file, which must exist
    pub fn load(path: &Path) -> CovResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CovError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            CovError::Config { message } => {
                CovError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Load `covrun.yaml` from the repository root, or defaults when absent
    pub fn discover(root: &Path) -> CovResult<Self> {
        let path = root.join(SETTINGS_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading settings file");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Set the build profile
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the kcov program
    #[must_use]
    pub fn with_kcov(mut self, kcov: impl Into<String>) -> Self {
        self.kcov = kcov.into();
        self
    }

    /// Set the ignore markers
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Directory name cargo writes this profile's artifacts to
    #[must_use]
    pub fn profile_dir_name(&self) -> &str {
        match self.profile.as_str() {
            "dev" | "test" | "debug" => "debug",
            "release" | "bench" => "release",
            other => other,
        }
    }

    /// Cargo flags selecting the profile
    #[must_use]
    pub fn profile_args(&self) -> Vec<String> {
        match self.profile.as_str() {
            "dev" | "test" | "debug" => Vec::new(),
            "release" => vec!["--release".to_string()],
            other => vec!["--profile".to_string(), other.to_string()],
        }
    }

    /// Reject settings kcov or cargo cannot work with
    pub fn validate(&self) -> CovResult<()> {
        if self.profile.trim().is_empty() {
            return Err(CovError::config("profile must not be empty"));
        }
        if self.kcov.trim().is_empty() || self.cargo.trim().is_empty() {
            return Err(CovError::config("tool programs must not be empty"));
        }
        if self.include_dirs.is_empty() {
            return Err(CovError::config("include_dirs must list at least one directory"));
        }
        if self.include_dirs.iter().any(|d| d.trim().is_empty()) {
            return Err(CovError::config("include_dirs entries must not be empty"));
        }
        self.exclusions.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod exclusion_tests {
        use super::*;

        #[test]
        fn test_default_markers() {
            let rules = ExclusionRules::default();
            assert_eq!(rules.line, "kcov-ignore");
            assert_eq!(rules.region_start, "kcov-ignore-start");
            assert_eq!(rules.region_end, "kcov-ignore-end");
        }

        #[test]
        fn test_kcov_args() {
            let args = ExclusionRules::default().kcov_args();
            assert_eq!(args[0], "--exclude-line=kcov-ignore");
            assert_eq!(
                args[1],
                "--exclude-region=kcov-ignore-start:kcov-ignore-end"
            );
        }

        #[test]
        fn test_parse_region() {
            let (start, end) = ExclusionRules::parse_region("begin:finish").unwrap();
            assert_eq!(start, "begin");
            assert_eq!(end, "finish");
        }

        #[test]
        fn test_parse_region_keeps_later_colons_in_end() {
            let (start, end) = ExclusionRules::parse_region("a:b:c").unwrap();
            assert_eq!(start, "a");
            assert_eq!(end, "b:c");
        }

        #[test]
        fn test_parse_region_invalid() {
            assert!(ExclusionRules::parse_region("nocolon").is_err());
            assert!(ExclusionRules::parse_region(":end").is_err());
            assert!(ExclusionRules::parse_region("start:").is_err());
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_defaults_are_valid() {
            let settings = CoverageSettings::default();
            assert_eq!(settings.profile, "debug");
            assert_eq!(settings.kcov, "kcov");
            assert_eq!(settings.cargo, "cargo");
            assert_eq!(settings.include_dirs, vec!["src", "tests"]);
            assert!(settings.validate().is_ok());
        }

        #[test]
        fn test_from_yaml_partial() {
            let yaml = "profile: release\nexclusions:\n  line: nocov\n";
            let settings = CoverageSettings::from_yaml_str(yaml).unwrap();
            assert_eq!(settings.profile, "release");
            assert_eq!(settings.exclusions.line, "nocov");
            assert_eq!(settings.exclusions.region_start, "kcov-ignore-start");
            assert_eq!(settings.kcov, "kcov");
        }

        #[test]
        fn test_from_yaml_empty() {
            let settings = CoverageSettings::from_yaml_str("  \n").unwrap();
            assert_eq!(settings, CoverageSettings::default());
        }

        #[test]
        fn test_from_yaml_unknown_field() {
            let result = CoverageSettings::from_yaml_str("colour: blue\n");
            assert!(matches!(result, Err(CovError::Config { .. })));
        }

        #[test]
        fn test_load_missing_file() {
            let result = CoverageSettings::load(Path::new("/nonexistent/covrun.yaml"));
            assert!(result.is_err());
        }

        #[test]
        fn test_load_reports_path_on_parse_error() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("bad.yaml");
            std::fs::write(&path, "profile: [unclosed").unwrap();

            let err = CoverageSettings::load(&path).unwrap_err();
            assert!(err.to_string().contains("bad.yaml"));
        }

        #[test]
        fn test_discover_without_file() {
            let temp = TempDir::new().unwrap();
            let settings = CoverageSettings::discover(temp.path()).unwrap();
            assert_eq!(settings, CoverageSettings::default());
        }

        #[test]
        fn test_discover_with_file() {
            let temp = TempDir::new().unwrap();
            std::fs::write(
                temp.path().join(SETTINGS_FILE),
                "build_args: [\"--workspace\"]\nkcov_args: [\"--verify\"]\n",
            )
            .unwrap();

            let settings = CoverageSettings::discover(temp.path()).unwrap();
            assert_eq!(settings.build_args, vec!["--workspace"]);
            assert_eq!(settings.kcov_args, vec!["--verify"]);
        }

        #[test]
        fn test_profile_dir_name() {
            let settings = CoverageSettings::new();
            assert_eq!(settings.profile_dir_name(), "debug");
            assert_eq!(settings.clone().with_profile("dev").profile_dir_name(), "debug");
            assert_eq!(
                settings.clone().with_profile("release").profile_dir_name(),
                "release"
            );
            assert_eq!(settings.with_profile("ci").profile_dir_name(), "ci");
        }

        #[test]
        fn test_profile_args() {
            let settings = CoverageSettings::new();
            assert!(settings.profile_args().is_empty());
            assert_eq!(
                settings.clone().with_profile("release").profile_args(),
                vec!["--release"]
            );
            assert_eq!(
                settings.with_profile("ci").profile_args(),
                vec!["--profile", "ci"]
            );
        }

        #[test]
        fn test_validate_rejects_empty_profile() {
            let settings = CoverageSettings::new().with_profile(" ");
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_validate_rejects_empty_include_dirs() {
            let mut settings = CoverageSettings::new();
            settings.include_dirs.clear();
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_validate_rejects_empty_marker() {
            let rules = ExclusionRules {
                line: String::new(),
                ..ExclusionRules::default()
            };
            let settings = CoverageSettings::new().with_exclusions(rules);
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_validate_rejects_colon_in_region_start() {
            let rules = ExclusionRules {
                region_start: "a:b".to_string(),
                ..ExclusionRules::default()
            };
            let settings = CoverageSettings::new().with_exclusions(rules);
            assert!(settings.validate().is_err());
        }
    }
}
