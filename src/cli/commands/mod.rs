//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository through [`Context::open`]
//! 2. Calls one view
//! 3. Formats and displays output, as JSON when `--json` is set
//!
//! Only `conflicts --take/--resolve` writes to the repository.

mod blame_cmd;
mod conflicts_cmd;
mod log_cmd;
mod status_cmd;
mod submodules_cmd;
mod tree_cmd;

// Re-export command functions for testing and direct invocation
pub use blame_cmd::blame;
pub use conflicts_cmd::{conflicts, ConflictOptions};
pub use log_cmd::log;
pub use status_cmd::status;
pub use submodules_cmd::submodules;
pub use tree_cmd::tree;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::{Context as _, Result};
use serde::Serialize;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Status { all } => status_cmd::status(ctx, all),
        Command::Blame { path, rev, lines } => blame_cmd::blame(ctx, &path, &rev, lines),
        Command::Tree {
            path,
            rev,
            recursive,
            long,
        } => tree_cmd::tree(ctx, path.as_deref(), &rev, recursive, long),
        Command::Conflicts {
            path,
            ours,
            theirs,
            take,
            resolve,
        } => conflicts_cmd::conflicts(
            ctx,
            ConflictOptions {
                path: path.as_deref(),
                ours: ours.as_deref(),
                theirs: theirs.as_deref(),
                take,
                resolve,
            },
        ),
        Command::Submodules {
            rev,
            order,
            include_root,
            shallow,
        } => submodules_cmd::submodules(ctx, &rev, order, include_root, shallow),
        Command::Log {
            rev,
            max_count,
            skip,
        } => log_cmd::log(ctx, &rev, max_count, skip),
    }
}

/// Print a value as pretty JSON on stdout.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
