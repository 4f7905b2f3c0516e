//! git::mock
//!
//! Mock gateway for deterministic testing.
//!
//! # Design
//!
//! The mock gateway answers invocations from canned responses keyed by the
//! rendered argv (and optionally the working directory) and records every
//! call it receives, so tests can assert how often a given listing was
//! fetched. Unmatched calls fail like a real nonzero exit.
//!
//! # Example
//!
//! ```
//! use plumbview::git::mock::MockGateway;
//! use plumbview::git::{CommandGateway, Invocation, Subcommand};
//!
//! let gateway = MockGateway::new();
//! gateway.respond(&["ls-files", "--others", "--exclude-standard"], "notes.txt\n");
//!
//! let inv = Invocation::new(Subcommand::LsFiles, "/repo")
//!     .switch("others")
//!     .switch("exclude_standard");
//! assert_eq!(gateway.invoke(&inv).unwrap(), "notes.txt\n");
//! assert_eq!(gateway.call_count(&["ls-files", "--others", "--exclude-standard"]), 1);
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use super::commands::Invocation;
use super::error::{ExitStatus, GitError};
use super::gateway::CommandGateway;

/// Mock gateway for testing.
///
/// Clones share state via internal `Rc<RefCell<...>>` wrapping, so a test
/// can hand one clone to a [`crate::git::Repo`] and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    inner: Rc<RefCell<MockGatewayInner>>,
}

#[derive(Debug, Default)]
struct MockGatewayInner {
    /// Canned replies; later entries take precedence.
    responses: Vec<Canned>,
    /// Recorded calls for verification.
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Clone)]
struct Canned {
    cwd: Option<PathBuf>,
    argv: Vec<String>,
    reply: Reply,
}

/// What the mock does when a canned entry matches.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit zero with this stdout.
    Output(String),
    /// Exit nonzero.
    Fail { status: i32, stderr: String },
}

/// One invocation the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub cwd: PathBuf,
    pub argv: Vec<String>,
    pub quote_paths: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `argv` (in any working directory) with `output`.
    pub fn respond(&self, argv: &[&str], output: impl Into<String>) -> &Self {
        self.push(None, argv, Reply::Output(output.into()))
    }

    /// Answer `argv` issued from `cwd` with `output`.
    ///
    /// Directory-specific entries win over [`MockGateway::respond`] entries.
    pub fn respond_in(
        &self,
        cwd: impl Into<PathBuf>,
        argv: &[&str],
        output: impl Into<String>,
    ) -> &Self {
        self.push(Some(cwd.into()), argv, Reply::Output(output.into()))
    }

    /// Make `argv` (in any working directory) exit with `status`.
    pub fn fail(&self, argv: &[&str], status: i32, stderr: impl Into<String>) -> &Self {
        self.push(
            None,
            argv,
            Reply::Fail {
                status,
                stderr: stderr.into(),
            },
        )
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.borrow().calls.clone()
    }

    /// Number of calls whose argv equals `argv`, in any directory.
    pub fn call_count(&self, argv: &[&str]) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| call.argv == argv)
            .count()
    }

    fn push(&self, cwd: Option<PathBuf>, argv: &[&str], reply: Reply) -> &Self {
        self.inner.borrow_mut().responses.push(Canned {
            cwd,
            argv: argv.iter().map(|s| s.to_string()).collect(),
            reply,
        });
        self
    }
}

impl CommandGateway for MockGateway {
    fn invoke(&self, invocation: &Invocation) -> Result<String, GitError> {
        let argv = invocation.argv()?;
        let cwd = invocation.cwd().to_path_buf();

        let mut inner = self.inner.borrow_mut();
        inner.calls.push(RecordedCall {
            cwd: cwd.clone(),
            argv: argv.clone(),
            quote_paths: invocation.quotes_paths(),
        });

        let specific = inner
            .responses
            .iter()
            .rev()
            .find(|c| c.argv == argv && c.cwd.as_ref() == Some(&cwd));
        let found = specific.or_else(|| {
            inner
                .responses
                .iter()
                .rev()
                .find(|c| c.argv == argv && c.cwd.is_none())
        });

        match found.map(|c| c.reply.clone()) {
            Some(Reply::Output(out)) => Ok(out),
            Some(Reply::Fail { status, stderr }) => Err(GitError::ExternalCommandFailed {
                command: format!("git {}", argv.join(" ")),
                status: ExitStatus(Some(status)),
                stderr,
            }),
            None => Err(GitError::ExternalCommandFailed {
                command: format!("git {}", argv.join(" ")),
                status: ExitStatus(Some(1)),
                stderr: format!("mock: no response for {:?} in {}", argv, cwd.display()),
            }),
        }
    }
}
