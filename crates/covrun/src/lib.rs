//! covrun: kcov coverage for Cargo workspaces
//!
//! Builds every test binary with `cargo test --no-run`, maps each binary
//! back to its package's source directory, runs kcov once per binary scoped
//! to that package's `src/` and `tests/`, and merges the reports into
//! `target/coverage/merged`.
//!
//! ```text
//! cargo test --no-run ──► test binaries ──► package dirs ──► kcov ×N ──► kcov --merge
//! ```
//!
//! Binaries whose package has no source directory are skipped. Any failing
//! cargo or kcov invocation ends the run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

pub mod app;
pub mod artifact;
mod commands;
mod config;
mod error;
pub mod kcov;
pub mod logging;
mod output;
pub mod package;
pub mod paths;
pub mod pipeline;
pub mod settings;
pub mod summary;
pub mod tools;

pub use app::execute;
pub use artifact::{package_name, parse_build_output, TestArtifact};
pub use commands::{Cli, ColorArg};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CovError, CovResult};
pub use kcov::Kcov;
pub use output::{summary_lines, OutputFormat, ProgressReporter};
pub use package::PackageLocator;
pub use paths::RepoPaths;
pub use pipeline::CoveragePipeline;
pub use settings::{CoverageSettings, ExclusionRules};
pub use summary::{CoveredArtifact, MergedTotals, RunSummary};
pub use tools::{Invocation, SystemToolchain, Toolchain};
