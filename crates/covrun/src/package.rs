//! Package source directory lookup

use crate::error::CovResult;
use std::path::{Path, PathBuf};

/// What the root manifest says about its own package
#[derive(Debug, Clone, PartialEq, Eq)]
enum RootPackage {
    /// `[package] name = "..."` is declared
    Declared(String),
    /// Parsed fine, no `[package]` table (virtual workspace)
    Virtual,
    /// Not valid TOML; matched textually
    Unparsed(String),
}

impl RootPackage {
    fn from_manifest(contents: &str) -> Self {
        match contents.parse::<toml::Table>() {
            Ok(table) => table
                .get("package")
                .and_then(|p| p.get("name"))
                .and_then(toml::Value::as_str)
                .map_or(Self::Virtual, |name| Self::Declared(name.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, "root manifest is not valid TOML, matching package names textually");
                Self::Unparsed(contents.to_string())
            }
        }
    }

    fn is(&self, package: &str) -> bool {
        match self {
            Self::Declared(name) => name == package,
            Self::Virtual => false,
            Self::Unparsed(contents) => declares_name_textually(contents, package),
        }
    }
}

/// `name = "<package>"` on a line of its own, whitespace-insensitive
fn declares_name_textually(contents: &str, package: &str) -> bool {
    contents.lines().any(|line| {
        line.split_once('=').is_some_and(|(key, value)| {
            key.trim() == "name" && value.trim().trim_matches('"') == package
        })
    })
}

/// Maps package names to the directory holding their sources
#[derive(Debug, Clone)]
pub struct PackageLocator {
    root: PathBuf,
    root_package: RootPackage,
}

impl PackageLocator {
    /// Read the root manifest once and build a locator
    pub fn load(root: &Path, manifest: &Path) -> CovResult<Self> {
        let contents = std::fs::read_to_string(manifest)?;
        Ok(Self::from_manifest_str(root, &contents))
    }

    /// Build a locator from manifest text
    #[must_use]
    pub fn from_manifest_str(root: &Path, contents: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            root_package: RootPackage::from_manifest(contents),
        }
    }

    /// Name of the package declared by the root manifest, if any
    #[must_use]
    pub fn root_package(&self) -> Option<&str> {
        match &self.root_package {
            RootPackage::Declared(name) => Some(name),
            _ => None,
        }
    }

    /// Where `package` lives before checking the filesystem
    ///
    /// The root package maps to the repository root, everything else to a
    /// same-named subdirectory.
    #[must_use]
    pub fn candidate_dir(&self, package: &str) -> PathBuf {
        if self.root_package.is(package) {
            self.root.clone()
        } else {
            self.root.join(package)
        }
    }

    /// Source directory of `package`, `None` if it does not exist
    #[must_use]
    pub fn source_dir(&self, package: &str) -> Option<PathBuf> {
        if package.is_empty() {
            return None;
        }
        let dir = self.candidate_dir(package);
        if dir.is_dir() {
            Some(dir)
        } else {
            tracing::debug!(package, dir = %dir.display(), "no source directory, skipping");
            None
        }
    }
}
