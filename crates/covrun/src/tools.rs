//! External program invocation
//!
//! Every cargo and kcov call goes through [`Toolchain`] so a run can be
//! replayed against a recording fake in tests.

use crate::error::{CovError, CovResult};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments in order
    pub args: Vec<OsString>,
    /// Extra environment variables
    pub envs: Vec<(String, OsString)>,
    /// Working directory, inherited when `None`
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Start describing a command
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.envs.push((key.into(), value.as_ref().to_os_string()));
        self
    }

    /// Run the child in `dir`
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Value of an environment variable set on this invocation
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Arguments as lossy strings
    #[must_use]
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Build the `std::process::Command`
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{key}={} ", value.to_string_lossy())?;
        }
        f.write_str(&self.program)?;
        for arg in self.args_lossy() {
            if arg.contains(' ') {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs external programs on behalf of the pipeline
pub trait Toolchain {
    /// Resolve a program to an executable, `None` if it is not installed
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion and return stdout; stderr goes to the user
    fn capture(&self, invocation: &Invocation) -> CovResult<String>;

    /// Run to completion with inherited stdio
    fn run(&self, invocation: &Invocation) -> CovResult<()>;
}

/// [`Toolchain`] backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolchain;

impl Toolchain for SystemToolchain {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        find_program(program, std::env::var_os("PATH").as_deref())
    }

    fn capture(&self, invocation: &Invocation) -> CovResult<String> {
        tracing::debug!(command = %invocation, "capturing");
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| CovError::spawn(&invocation.program, e))?;

        if !output.status.success() {
            return Err(CovError::tool_failed(&invocation.program, output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run(&self, invocation: &Invocation) -> CovResult<()> {
        tracing::debug!(command = %invocation, "running");
        let status = invocation
            .to_command()
            .stdin(Stdio::null())
            .status()
            .map_err(|e| CovError::spawn(&invocation.program, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(CovError::tool_failed(&invocation.program, status))
        }
    }
}

/// Look a program up the way a shell would
///
/// Names containing a path separator are checked directly; bare names are
/// searched in each `search_path` entry.
#[must_use]
pub fn find_program(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    std::env::split_paths(search_path?)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
