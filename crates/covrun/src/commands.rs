//! CLI definition using clap

use crate::config::{CliConfig, ColorChoice, Verbosity};
use crate::error::CovResult;
use crate::output::OutputFormat;
use crate::settings::{CoverageSettings, ExclusionRules};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// covrun: build a workspace's tests, run kcov on each test binary and merge the reports
#[derive(Parser, Debug)]
#[command(name = "covrun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only failures are printed)
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorArg,

    /// Workspace Cargo.toml (default: located with `cargo locate-project`)
    #[arg(long, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Cargo target directory (default: <root>/target)
    #[arg(long, value_name = "PATH")]
    pub target_dir: Option<PathBuf>,

    /// Cargo profile the tests are built with
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// kcov program
    #[arg(long, value_name = "PROGRAM", env = "COVRUN_KCOV")]
    pub kcov: Option<String>,

    /// cargo program
    #[arg(long, value_name = "PROGRAM", env = "CARGO")]
    pub cargo: Option<String>,

    /// Marker that excludes a single line
    #[arg(long, value_name = "MARKER")]
    pub exclude_line: Option<String>,

    /// Markers delimiting an excluded region
    #[arg(long, value_name = "START:END")]
    pub exclude_region: Option<String>,

    /// Extra argument for `cargo test --no-run` (repeatable)
    #[arg(long = "build-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub build_args: Vec<String>,

    /// Extra argument for each per-binary kcov run (repeatable)
    #[arg(long = "kcov-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub kcov_args: Vec<String>,

    /// Settings file (default: <root>/covrun.yaml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Build and plan the kcov runs without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// UI configuration from the global flags
    #[must_use]
    pub fn cli_config(&self) -> CliConfig {
        let format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        CliConfig::new()
            .with_verbosity(Verbosity::from_flags(self.quiet, self.verbose))
            .with_color(self.color.into())
            .with_format(format)
            .with_dry_run(self.dry_run)
    }

    /// Layer the command-line overrides on top of file settings
    pub fn apply_to(&self, mut settings: CoverageSettings) -> CovResult<CoverageSettings> {
        if let Some(ref profile) = self.profile {
            settings.profile.clone_from(profile);
        }
        if let Some(ref kcov) = self.kcov {
            settings.kcov.clone_from(kcov);
        }
        if let Some(ref cargo) = self.cargo {
            settings.cargo.clone_from(cargo);
        }
        if let Some(ref marker) = self.exclude_line {
            settings.exclusions.line.clone_from(marker);
        }
        if let Some(ref region) = self.exclude_region {
            let (start, end) = ExclusionRules::parse_region(region)?;
            settings.exclusions.region_start = start;
            settings.exclusions.region_end = end;
        }
        settings.build_args.extend(self.build_args.iter().cloned());
        settings.kcov_args.extend(self.kcov_args.iter().cloned());

        settings.validate()?;
        Ok(settings)
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
