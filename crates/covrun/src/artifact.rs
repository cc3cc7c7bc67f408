//! Test binaries discovered from cargo's JSON messages

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// One test binary and the package that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestArtifact {
    /// Package name
    pub package: String,
    /// Path of the test binary
    pub path: PathBuf,
}

impl TestArtifact {
    /// Create an artifact record
    #[must_use]
    pub fn new(package: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            path: path.into(),
        }
    }
}

/// The slice of a `compiler-artifact` message we read
#[derive(Debug, Deserialize)]
struct CargoMessage {
    reason: String,
    #[serde(default)]
    package_id: Option<String>,
    #[serde(default)]
    profile: Option<ArtifactProfile>,
    #[serde(default)]
    filenames: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ArtifactProfile {
    #[serde(default)]
    test: bool,
}

/// Extract every test-profile output from `--message-format=json` output
///
/// Lines that are not JSON objects and messages other than
/// `compiler-artifact` are ignored. A binary reported more than once keeps
/// its first position.
#[must_use]
pub fn parse_build_output(stdout: &str) -> Vec<TestArtifact> {
    let mut artifacts = Vec::new();
    let mut seen = HashSet::new();

    for line in stdout.lines() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        let message: CargoMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::trace!(error = %e, "skipping unparseable cargo message");
                continue;
            }
        };
        if message.reason != "compiler-artifact" {
            continue;
        }
        if !message.profile.as_ref().is_some_and(|p| p.test) {
            continue;
        }
        let Some(package_id) = message.package_id else {
            continue;
        };

        let package = package_name(&package_id);
        for path in message.filenames {
            if !seen.insert(path.clone()) {
                tracing::debug!(artifact = %path.display(), "duplicate test binary");
                continue;
            }
            tracing::debug!(package = %package, artifact = %path.display(), "found test binary");
            artifacts.push(TestArtifact::new(package.clone(), path));
        }
    }

    artifacts
}

/// Normalize a cargo package id to the bare package name
///
/// Handles the legacy `name version (source)` form as well as URL-style
/// ids such as `path+file:///ws/name#0.1.0` and
/// `registry+https://...#name@1.2.3`.
#[must_use]
pub fn package_name(package_id: &str) -> String {
    let package_id = package_id.trim();

    if let Some((url, fragment)) = package_id.rsplit_once('#') {
        if !package_id.contains(char::is_whitespace) {
            if let Some((name, _version)) = fragment.split_once('@') {
                return name.to_string();
            }
            let last_segment = url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(url);
            return last_segment.to_string();
        }
    }

    package_id
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
