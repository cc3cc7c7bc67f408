//! Run summary and merged coverage totals

use crate::artifact::TestArtifact;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subdirectory kcov writes inside a merge output
pub const KCOV_MERGED_DIR: &str = "kcov-merged";

/// A test binary that was (or, in a dry run, would be) run under kcov
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveredArtifact {
    /// The binary
    #[serde(flatten)]
    pub artifact: TestArtifact,
    /// Package source directory kcov was scoped to
    pub package_dir: PathBuf,
    /// Per-binary report directory
    pub output_dir: PathBuf,
}

/// Overall numbers from kcov's merged `coverage.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTotals {
    /// Percentage of instrumented lines hit
    pub percent_covered: f64,
    /// Lines hit
    pub covered_lines: u64,
    /// Instrumented lines
    pub total_lines: u64,
}

impl MergedTotals {
    /// Read `<merged>/kcov-merged/coverage.json`, if kcov produced one
    #[must_use]
    pub fn read(merged_dir: &Path) -> Option<Self> {
        let path = merged_dir.join(KCOV_MERGED_DIR).join("coverage.json");
        let content = std::fs::read_to_string(&path).ok()?;
        let totals = Self::from_json(&content);
        if totals.is_none() {
            tracing::warn!(path = %path.display(), "could not read merged coverage totals");
        }
        totals
    }

    /// Parse kcov's JSON report, which writes numbers as strings or numbers
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_json(content: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(content).ok()?;
        Some(Self {
            percent_covered: number_field(&value, "percent_covered")?,
            covered_lines: number_field(&value, "covered_lines")? as u64,
            total_lines: number_field(&value, "total_lines")? as u64,
        })
    }
}

fn number_field(value: &serde_json::Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// What a coverage run did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Binaries run under kcov, in run order
    pub covered: Vec<CoveredArtifact>,
    /// Binaries whose package has no source directory
    pub skipped: Vec<TestArtifact>,
    /// Merged report, `None` when nothing was merged
    pub merged_dir: Option<PathBuf>,
    /// Totals from the merged report
    pub totals: Option<MergedTotals>,
    /// Whether kcov was actually invoked
    pub dry_run: bool,
}

impl RunSummary {
    /// Per-binary report directories, one per covered binary
    #[must_use]
    pub fn coverage_dirs(&self) -> Vec<PathBuf> {
        self.covered.iter().map(|c| c.output_dir.clone()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_totals_from_string_fields() {
        let json = r#"{"files": [], "percent_covered": "72.50", "covered_lines": "29", "total_lines": "40"}"#;
        let totals = MergedTotals::from_json(json).unwrap();
        assert_eq!(totals.percent_covered, 72.5);
        assert_eq!(totals.covered_lines, 29);
        assert_eq!(totals.total_lines, 40);
    }

    #[test]
    fn test_totals_from_number_fields() {
        let json = r#"{"percent_covered": 100.0, "covered_lines": 8, "total_lines": 8}"#;
        let totals = MergedTotals::from_json(json).unwrap();
        assert_eq!(totals.percent_covered, 100.0);
        assert_eq!(totals.total_lines, 8);
    }

    #[test]
    fn test_totals_missing_field() {
        assert!(MergedTotals::from_json(r#"{"percent_covered": "1.0"}"#).is_none());
        assert!(MergedTotals::from_json("not json").is_none());
        assert!(MergedTotals::from_json(r#"{"percent_covered": [], "covered_lines": 1, "total_lines": 1}"#).is_none());
    }

    #[test]
    fn test_read_from_merged_dir() {
        let temp = TempDir::new().unwrap();
        let kcov_merged = temp.path().join(KCOV_MERGED_DIR);
        std::fs::create_dir_all(&kcov_merged).unwrap();
        std::fs::write(
            kcov_merged.join("coverage.json"),
            r#"{"percent_covered": "50.00", "covered_lines": 1, "total_lines": 2}"#,
        )
        .unwrap();

        let totals = MergedTotals::read(temp.path()).unwrap();
        assert_eq!(totals.covered_lines, 1);
    }

    #[test]
    fn test_read_absent_report() {
        let temp = TempDir::new().unwrap();
        assert!(MergedTotals::read(temp.path()).is_none());
    }

    #[test]
    fn test_summary_serializes_flat_artifact() {
        let summary = RunSummary {
            covered: vec![CoveredArtifact {
                artifact: TestArtifact::new("a", "/t/debug/deps/a-1"),
                package_dir: PathBuf::from("/ws/a"),
                output_dir: PathBuf::from("/t/coverage/a-1"),
            }],
            skipped: vec![TestArtifact::new("gone", "/t/debug/deps/gone-2")],
            ..RunSummary::default()
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["covered"][0]["package"], "a");
        assert_eq!(json["covered"][0]["output_dir"], "/t/coverage/a-1");
        assert_eq!(json["skipped"][0]["package"], "gone");
        assert!(json["merged_dir"].is_null());
        assert_eq!(summary.coverage_dirs(), vec![PathBuf::from("/t/coverage/a-1")]);
    }
}
