//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pview - typed views over git plumbing
#[derive(Parser, Debug)]
#[command(name = "pview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if pview was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Traversal order flag.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderArg {
    /// Parents before children
    Pre,
    /// Children before parents
    Post,
}

/// Conflict side flag.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideArg {
    Ours,
    Theirs,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show working tree status
    #[command(
        name = "status",
        long_about = "Show how each path differs from the index and HEAD.\n\n\
            Status is reconciled from several plumbing listings. A conflicted path \
            is reported as conflicted even if it is also modified, and a tracked \
            path is never reported as untracked.",
        after_help = "\
CODES:
    M  modified in the worktree
    A  added to the index
    D  deleted from the worktree
    U  unmerged (conflicted)
    ?  untracked"
    )]
    Status {
        /// Also list unmodified tracked paths
        #[arg(short, long)]
        all: bool,
    },

    /// Show who last changed each line of a file
    #[command(name = "blame")]
    Blame {
        /// File to blame, relative to the repository root
        path: String,

        /// Revision to blame at
        #[arg(long, default_value = "HEAD")]
        rev: String,

        /// Restrict to lines START,END (1-based, inclusive)
        #[arg(short = 'L', value_name = "START,END", value_parser = parse_range)]
        lines: Option<(usize, usize)>,
    },

    /// List a tree at a revision
    #[command(name = "tree")]
    Tree {
        /// Subdirectory to list
        path: Option<String>,

        /// Revision to list
        #[arg(long, default_value = "HEAD")]
        rev: String,

        /// Descend into subtrees
        #[arg(short, long)]
        recursive: bool,

        /// Show blob sizes
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Show conflict sections of files left by a failed merge
    #[command(
        name = "conflicts",
        after_help = "\
EXAMPLES:
    # Show all conflicted files with branch names as labels
    pview conflicts --ours main --theirs feature

    # Keep our side of one file and mark it resolved
    pview conflicts src/lib.rs --take ours --resolve"
    )]
    Conflicts {
        /// Only this file
        path: Option<String>,

        /// Label for our side (defaults to the configured label)
        #[arg(long)]
        ours: Option<String>,

        /// Label for their side (defaults to the configured label)
        #[arg(long)]
        theirs: Option<String>,

        /// Rewrite the file keeping one side of every conflict
        #[arg(long, value_enum)]
        take: Option<SideArg>,

        /// Stage the file afterwards
        #[arg(long)]
        resolve: bool,
    },

    /// Walk the submodule forest of a commit
    #[command(name = "submodules")]
    Submodules {
        /// Commit whose manifest to read
        #[arg(long, default_value = "HEAD")]
        rev: String,

        /// Visit order
        #[arg(long, value_enum, default_value = "pre")]
        order: OrderArg,

        /// Also report the root repository
        #[arg(long)]
        include_root: bool,

        /// Do not descend into nested submodules
        #[arg(long)]
        shallow: bool,
    },

    /// List commit ids reachable from a revision
    #[command(name = "log")]
    Log {
        /// Starting revision
        #[arg(default_value = "HEAD")]
        rev: String,

        /// Maximum number of commits
        #[arg(short = 'n', long)]
        max_count: Option<usize>,

        /// Skip this many commits first
        #[arg(long)]
        skip: Option<usize>,
    },
}

/// Parse `START,END` into an inclusive line range.
fn parse_range(raw: &str) -> Result<(usize, usize), String> {
    let (start, end) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected START,END, got '{}'", raw))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start line '{}'", start))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end line '{}'", end))?;
    if start == 0 || end < start {
        return Err(format!("invalid line range {}..{}", start, end));
    }
    Ok((start, end))
}
