//! git
//!
//! Single interface for all plumbing invocations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to the external `git` process. Views
//! never spawn processes themselves; they build an [`Invocation`] through a
//! [`Repo`] and receive raw text back from a [`CommandGateway`].
//!
//! # Responsibilities
//!
//! - Command table: validated option keys per subcommand
//! - Gateway: process execution and exit-status checking
//! - Repository handle: working directory, settings, worktree file I/O
//! - Row parsers for the tabular plumbing formats
//!
//! # Invariants
//!
//! - Unknown option keys are rejected before anything is spawned
//! - Nonzero exits always surface as [`GitError::ExternalCommandFailed`]
//! - Nothing here retries
//!
//! # Example
//!
//! ```no_run
//! use plumbview::git::Repo;
//! use std::path::Path;
//!
//! let repo = Repo::discover(Path::new("."))?;
//! let status = repo.status()?;
//! for path in status.modified_names() {
//!     println!("{}", path);
//! }
//! # Ok::<(), plumbview::git::GitError>(())
//! ```

mod commands;
mod error;
mod gateway;
pub mod mock;
mod repo;
pub mod rows;

pub use commands::{FlagRule, Invocation, OptionValue, Subcommand};
pub use error::{ExitStatus, GitError};
pub use gateway::{CliGateway, CommandGateway};
pub use repo::{Page, Repo, RepoSettings};
