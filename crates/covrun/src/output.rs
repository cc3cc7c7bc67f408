//! Output formatting and progress reporting

use crate::summary::RunSummary;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

/// How the run summary is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text on stderr
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Progress reporter for coverage runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over the test binaries
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a line above the progress bar if one is active
    fn write_line(&self, line: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.suspend(|| {
                let _ = self.term.write_line(line);
            });
        } else {
            let _ = self.term.write_line(line);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "DONE".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.write_line("");
        self.write_line(&styled);
    }

    /// Print the end-of-run summary
    pub fn summary(&self, summary: &RunSummary) {
        if self.quiet {
            return;
        }

        let _ = self.term.write_line("");
        for line in summary_lines(summary, self.use_color) {
            let _ = self.term.write_line(&line);
        }
    }
}

/// Text lines describing a finished run
#[must_use]
pub fn summary_lines(summary: &RunSummary, use_color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let covered = summary.covered.len();
    let skipped = summary.skipped.len();

    let status = if summary.dry_run { "PLANNED" } else { "COVERED" };
    let status = if use_color {
        Style::new().green().bold().apply_to(status).to_string()
    } else {
        status.to_string()
    };
    lines.push(format!(
        "{status} {covered} test binaries ({skipped} skipped)"
    ));

    for artifact in &summary.skipped {
        lines.push(format!(
            "  skipped {} (package '{}' has no source directory)",
            artifact.path.display(),
            artifact.package
        ));
    }

    if let Some(ref merged) = summary.merged_dir {
        lines.push(format!("Merged report: {}", merged.display()));
    }

    if let Some(ref totals) = summary.totals {
        let percent = format!("{:.2}%", totals.percent_covered);
        let percent = if use_color {
            Style::new().bold().apply_to(percent).to_string()
        } else {
            percent
        };
        lines.push(format!(
            "Line coverage: {percent} ({}/{} lines)",
            totals.covered_lines, totals.total_lines
        ));
    }

    lines
}
