//! # Subprocess Transport
//!
//! The actual git sparse-checkout and the docs-directory lift are done by two
//! small bash scripts embedded in the binary. This module defines the
//! [`ScriptRunner`] seam the rest of the crate talks to, so tests can replace
//! the scripts with in-process fakes.
//!
//! Scripts are passed to `bash -c` directly, so nothing has to be installed on
//! `PATH` besides `bash` and `git`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, trace};
use tokio::process::Command;

use crate::error::{Error, Result};

/// Exit status used by the scripts when a required tool is missing.
const EXIT_TOOL_MISSING: i32 = 127;

/// The scripts a runner knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// `sparse_clone.sh <url> <name> <branch> <path>...`, run in the temp dir.
    SparseClone,
    /// `mv_docs_up.sh <docs_dir> [target]`, run in the repository location.
    MoveDocsUp,
}

impl Script {
    /// File name of the script, used as `$0`.
    pub fn name(self) -> &'static str {
        match self {
            Script::SparseClone => "sparse_clone.sh",
            Script::MoveDocsUp => "mv_docs_up.sh",
        }
    }

    /// The script body.
    pub fn source(self) -> &'static str {
        match self {
            Script::SparseClone => include_str!("../scripts/sparse_clone.sh"),
            Script::MoveDocsUp => include_str!("../scripts/mv_docs_up.sh"),
        }
    }
}

/// Captured result of a script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    /// A successful run with empty output.
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into an error for repository `name`.
    pub fn check(self, name: &str, url: &str) -> Result<Self> {
        match self.code {
            Some(0) => Ok(self),
            Some(EXIT_TOOL_MISSING) => Err(Error::ToolMissing {
                tool: "git".to_string(),
                message: self.stderr.trim().to_string(),
            }),
            code => Err(Error::Fetch {
                name: name.to_string(),
                url: url.to_string(),
                stderr: if self.stderr.trim().is_empty() {
                    format!("script exited with {:?}", code)
                } else {
                    self.stderr.trim().to_string()
                },
            }),
        }
    }
}

/// Runs the embedded scripts.
///
/// Implementations must be safe to call concurrently for different working
/// directories.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: Script, args: &[String], cwd: &Path) -> Result<ScriptOutput>;
}

/// Runs scripts with the host's `bash`.
#[derive(Debug, Clone)]
pub struct BashRunner {
    bash: PathBuf,
}

impl BashRunner {
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    /// Uses the given shell executable instead of `bash` from `PATH`.
    pub fn with_shell(bash: impl Into<PathBuf>) -> Self {
        Self { bash: bash.into() }
    }
}

impl Default for BashRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptRunner for BashRunner {
    async fn run(&self, script: Script, args: &[String], cwd: &Path) -> Result<ScriptOutput> {
        debug!("Running {} {:?} in {}", script.name(), args, cwd.display());

        let output = Command::new(&self.bash)
            .arg("-c")
            .arg(script.source())
            .arg(script.name())
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::ToolMissing {
                    tool: self.bash.display().to_string(),
                    message: e.to_string(),
                },
                _ => Error::Io(e),
            })?;

        let result = ScriptOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!("{} finished with {:?}", script.name(), result.code);
        Ok(result)
    }
}
