//! cli
//!
//! Command-line interface layer for plumbview.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Open the repository and configuration, then delegate to handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers call into [`crate::views`] through a
//! [`crate::git::Repo`] and only format what comes back. Library errors are
//! wrapped with `anyhow` context here and nowhere else.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::git::{CliGateway, Repo};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// JSON output.
    pub json: bool,
}

/// An opened repository with its merged configuration.
#[derive(Debug)]
pub struct Session {
    pub repo: Repo,
    pub config: Config,
}

impl Context {
    /// Discover the repository and load its configuration.
    ///
    /// The global config is read first because it names the git binary used
    /// for discovery; the repo config is layered on once the root is known.
    pub fn open(&self) -> Result<Session> {
        let cwd = match &self.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let global = Config::load(None).context("Failed to load configuration")?;
        let gateway = Rc::new(CliGateway::with_binary(global.config.git_binary()));
        let repo = Repo::discover_with(&cwd, gateway)
            .with_context(|| format!("Not a git repository: {}", cwd.display()))?;

        let loaded = Config::load(Some(repo.work_dir())).context("Failed to load configuration")?;
        for warning in &loaded.warnings {
            warn!(path = %warning.path.display(), "{}", warning.message);
        }
        let repo = repo.with_settings(loaded.config.repo_settings());

        Ok(Session {
            repo,
            config: loaded.config,
        })
    }
}

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects debug output for
/// this crate and warnings are shown by default.
fn init_logging(debug: bool) {
    let default = if debug { "plumbview=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second init (tests calling run twice) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}
