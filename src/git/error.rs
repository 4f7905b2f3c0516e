//! git::error
//!
//! Error taxonomy shared by the gateway and every parser.
//!
//! # Error Handling
//!
//! - [`GitError::ExternalCommandFailed`]: the plumbing command exited nonzero
//! - [`GitError::MalformedInput`]: output violated the grammar a parser expects
//! - [`GitError::InvalidObjectKind`]: a tree listing reported an unknown type
//! - [`GitError::UnknownOption`]: an option key missing from the command table
//!
//! Lookup misses are never errors; they surface as `None` or empty views.
//! Nothing in this crate retries.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::TypeError;

/// Errors from plumbing invocations and the parsers over their output.
#[derive(Debug, Error)]
pub enum GitError {
    /// The external command ran and exited with a nonzero status.
    #[error("`{command}` failed with {status}: {stderr}")]
    ExternalCommandFailed {
        /// The rendered command line
        command: String,
        /// Exit code, or `None` when terminated by a signal
        status: ExitStatus,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The external command could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The rendered command line
        command: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Output did not follow the expected grammar.
    #[error("malformed {context}: {message}")]
    MalformedInput {
        /// Which format was being parsed (e.g. "blame porcelain")
        context: &'static str,
        /// What was wrong, usually quoting the offending line
        message: String,
    },

    /// A tree listing row carried an unrecognized object type.
    #[error("invalid object kind '{kind}' in listing line: {line}")]
    InvalidObjectKind {
        /// The type column as printed
        kind: String,
        /// The full listing line
        line: String,
    },

    /// An option key has no rule in the command table for this subcommand.
    #[error("unknown option '{key}' for {subcommand}")]
    UnknownOption {
        /// The subcommand name
        subcommand: &'static str,
        /// The rejected key
        key: String,
    },

    /// An option key is known but was given a value of the wrong shape.
    #[error("invalid value for option '{key}' of {subcommand}: {message}")]
    InvalidOptionValue {
        /// The subcommand name
        subcommand: &'static str,
        /// The option key
        key: String,
        /// Description of the mismatch
        message: String,
    },

    /// A value failed strong-type validation.
    #[error(transparent)]
    InvalidValue(#[from] TypeError),

    /// Reading or writing a worktree file failed.
    #[error("i/o error on '{path}': {source}")]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

impl GitError {
    /// Shorthand for building a [`GitError::MalformedInput`].
    pub(crate) fn malformed(context: &'static str, message: impl Into<String>) -> Self {
        GitError::MalformedInput {
            context,
            message: message.into(),
        }
    }

    /// Check whether this is a nonzero exit of the external command.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, GitError::ExternalCommandFailed { .. })
    }
}

/// Exit status of a failed external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(pub Option<i32>);

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "signal termination"),
        }
    }
}
