//! git::gateway
//!
//! The single doorway to the external `git` process.
//!
//! Every view in this crate obtains its raw text through
//! [`CommandGateway::invoke`]. The production implementation,
//! [`CliGateway`], spawns the configured git binary and blocks until it
//! exits; tests substitute [`crate::git::mock::MockGateway`].

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, trace};

use super::commands::Invocation;
use super::error::{ExitStatus, GitError};

/// Executes plumbing invocations and returns their standard output.
///
/// Implementations must fail with [`GitError::ExternalCommandFailed`] when
/// the command exits nonzero, and must not retry.
pub trait CommandGateway {
    /// Run one invocation to completion.
    fn invoke(&self, invocation: &Invocation) -> Result<String, GitError>;
}

/// Gateway that runs a real git executable.
#[derive(Debug, Clone)]
pub struct CliGateway {
    /// Program to execute
    binary: PathBuf,
}

impl CliGateway {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Full argument vector passed to the program, global settings included.
    fn full_argv(&self, invocation: &Invocation) -> Result<Vec<String>, GitError> {
        let mut argv = Vec::new();
        if !invocation.quotes_paths() {
            argv.push("-c".to_string());
            argv.push("core.quotePath=false".to_string());
        }
        argv.extend(invocation.argv()?);
        Ok(argv)
    }
}

impl Default for CliGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandGateway for CliGateway {
    fn invoke(&self, invocation: &Invocation) -> Result<String, GitError> {
        let argv = self.full_argv(invocation)?;
        let rendered = format!("{} {}", self.binary.display(), argv.join(" "));
        debug!(command = %rendered, cwd = %invocation.cwd().display(), "invoking git");

        let output = Command::new(&self.binary)
            .args(&argv)
            .current_dir(invocation.cwd())
            .output()
            .map_err(|source| GitError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::ExternalCommandFailed {
                command: rendered,
                status: ExitStatus(output.status.code()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!(bytes = stdout.len(), "git output received");
        Ok(stdout)
    }
}
