//! Error types for coverage runs

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for coverage operations
pub type CovResult<T> = Result<T, CovError>;

/// Errors that abort a coverage run
#[derive(Debug, Error)]
pub enum CovError {
    /// A required external program is not installed
    #[error("{tool} not found. {hint}")]
    MissingTool {
        /// Program that was looked up
        tool: String,
        /// How to get it
        hint: String,
    },

    /// An external program exited unsuccessfully
    #[error("{tool} failed ({status})")]
    ToolFailed {
        /// Program that failed
        tool: String,
        /// Human-readable exit status
        status: String,
    },

    /// An external program could not be started
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        /// Program that could not be spawned
        tool: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The workspace manifest could not be located
    #[error("Manifest not found: {}", path.display())]
    ManifestNotFound {
        /// Path that was tried
        path: PathBuf,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CovError {
    /// Create a missing tool error
    #[must_use]
    pub fn missing_tool(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Create a tool failure from a process exit status
    #[must_use]
    pub fn tool_failed(tool: impl Into<String>, status: ExitStatus) -> Self {
        Self::tool_exit(tool, status.code())
    }

    /// Create a tool failure from a raw exit code (`None` when killed by a signal)
    #[must_use]
    pub fn tool_exit(tool: impl Into<String>, code: Option<i32>) -> Self {
        let status = code.map_or_else(
            || "terminated by signal".to_string(),
            |code| format!("exit code {code}"),
        );
        Self::ToolFailed {
            tool: tool.into(),
            status,
        }
    }

    /// Create a spawn error
    #[must_use]
    pub fn spawn(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a manifest not found error
    #[must_use]
    pub fn manifest_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_error() {
        let err = CovError::missing_tool("kcov", "Install it with your package manager.");
        assert!(err.to_string().contains("kcov not found"));
        assert!(err.to_string().contains("package manager"));
    }

    #[test]
    fn test_tool_exit_code() {
        let err = CovError::tool_exit("cargo", Some(101));
        assert_eq!(err.to_string(), "cargo failed (exit code 101)");
    }

    #[test]
    fn test_tool_exit_signal() {
        let err = CovError::tool_exit("kcov", None);
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_spawn_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CovError::spawn("kcov", io_err);
        assert!(err.to_string().contains("Failed to run kcov"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error() {
        let err = CovError::config("bad marker");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad marker"));
    }

    #[test]
    fn test_manifest_not_found() {
        let err = CovError::manifest_not_found("/nope/Cargo.toml");
        assert!(err.to_string().contains("/nope/Cargo.toml"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CovError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CovError = json_err.into();
        assert!(err.to_string().contains("JSON"));
    }
}
